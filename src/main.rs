fn main() -> std::process::ExitCode {
    pmwatch_lib::run()
}
