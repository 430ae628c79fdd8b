use std::{
    env,
    path::PathBuf,
    process::{Child, Command, Stdio},
    sync::{
        mpsc::{self, Sender},
        Arc, Mutex,
    },
    thread,
};

use log::{debug, warn};

/// Spoken warnings. `speak` replaces whatever is still being spoken.
pub trait Speaker: Send + Sync {
    fn speak(&self, text: &str) -> Result<(), String>;
    fn cancel(&self);
}

/// Platform text-to-speech command.
#[derive(Debug, Clone)]
pub struct SpeechProgram {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl SpeechProgram {
    /// First available of `say` (macOS), `spd-say`, `espeak-ng`, `espeak`.
    pub fn detect() -> Option<Self> {
        let candidates: &[(&str, &[&str])] = if cfg!(target_os = "macos") {
            &[("say", &[])]
        } else {
            &[("spd-say", &["--wait"]), ("espeak-ng", &[]), ("espeak", &[])]
        };

        candidates.iter().find_map(|(name, args)| {
            find_in_path(name).map(|program| SpeechProgram {
                program,
                args: args.iter().map(|a| a.to_string()).collect(),
            })
        })
    }
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

enum SpeechCommand {
    Speak(String),
    Cancel,
}

/// Owns a dedicated thread that runs one utterance at a time.
pub struct SpeechEngineHandle {
    tx: Arc<Mutex<Option<Sender<SpeechCommand>>>>,
    program: Option<SpeechProgram>,
}

impl SpeechEngineHandle {
    pub fn new(program: Option<SpeechProgram>) -> Self {
        if program.is_none() {
            warn!("No text-to-speech command found; spoken warnings are disabled");
        }
        Self {
            tx: Arc::new(Mutex::new(None)),
            program,
        }
    }

    pub fn detect() -> Self {
        Self::new(SpeechProgram::detect())
    }

    fn ensure_thread(&self) -> Result<Sender<SpeechCommand>, String> {
        let mut guard = self.tx.lock().map_err(|e| e.to_string())?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let program = self
            .program
            .clone()
            .ok_or_else(|| "no text-to-speech command available".to_string())?;
        let (tx, rx) = mpsc::channel::<SpeechCommand>();

        thread::Builder::new()
            .name("speech-engine".to_string())
            .spawn(move || {
                let mut current: Option<Child> = None;

                fn stop(current: &mut Option<Child>) {
                    if let Some(mut child) = current.take() {
                        let _ = child.kill();
                        let _ = child.wait();
                    }
                }

                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        SpeechCommand::Speak(text) => {
                            stop(&mut current);
                            match Command::new(&program.program)
                                .args(&program.args)
                                .arg(&text)
                                .stdin(Stdio::null())
                                .stdout(Stdio::null())
                                .stderr(Stdio::null())
                                .spawn()
                            {
                                Ok(child) => {
                                    debug!("Speaking: {text}");
                                    current = Some(child);
                                }
                                Err(err) => {
                                    warn!(
                                        "Failed to run {}: {err}",
                                        program.program.display()
                                    );
                                }
                            }
                        }
                        SpeechCommand::Cancel => {
                            stop(&mut current);
                        }
                    }
                }

                stop(&mut current);
            })
            .map_err(|e| e.to_string())?;

        *guard = Some(tx.clone());
        Ok(tx)
    }
}

impl Speaker for SpeechEngineHandle {
    fn speak(&self, text: &str) -> Result<(), String> {
        let tx = self.ensure_thread()?;
        tx.send(SpeechCommand::Speak(text.to_string()))
            .map_err(|e| e.to_string())
    }

    fn cancel(&self) {
        // Never spin up the thread just to cancel.
        if let Ok(Some(tx)) = self.tx.lock().map(|g| g.clone()) {
            let _ = tx.send(SpeechCommand::Cancel);
        }
    }
}

/// Warning sentence for an alert at `label`.
pub fn warning_utterance(label: &str) -> String {
    format!("Warning! High air pollution detected for {label}.")
}
