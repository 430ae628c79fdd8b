//! Command-line front end.

use std::{
    collections::{HashMap, HashSet},
    fs,
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{anyhow, bail, Context, Result};
use log::info;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    dashboard::{load_date_detail, render, DashboardController},
    error::ViewError,
    export::{self, DateFilter},
    menu::{sidebar_items, MenuItem},
    models::{Reading, ReadingField},
    notify::NotificationDispatcher,
    session::{NotificationPermission, PermissionPrompt, UserProfile},
    utils::format_count,
    AppState,
};

pub const USAGE: &str = "\
Usage: pmwatch <command> [options]

Commands:
  watch                               Live dashboard ('ack' acknowledges, 'q' quits)
  import <file.json>                  Merge an env_logs export into the store
  record <date> <key> <json>          Write one reading
  dates [--search S] [--start D] [--end D]
                                      List stored dates, newest first
  show <date>                         Records of one date
  export <date> [--out DIR]           Write env_data_<date>.csv
  export-range [--search S] [--start D] [--end D] [--out DIR]
                                      Write every record of the matching dates
  login --email E [--first F] [--last L] [--role R]
  logout [--yes]
  notifications request               Ask to enable desktop notifications
  alerts [--threshold N] [--voice on|off] [--blink on|off]
                                      Show or change alert settings
  menu                                Sidebar entries for the current session
  help";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Watch,
    Import { file: PathBuf },
    Record { date: String, key: String, json: String },
    Dates { filter: DateFilter },
    Show { date: Option<String> },
    Export { date: String, out: Option<PathBuf> },
    ExportRange { filter: DateFilter, out: Option<PathBuf> },
    Login { profile: UserProfile },
    Logout { confirmed: bool },
    RequestNotifications,
    Alerts {
        threshold: Option<f64>,
        voice: Option<bool>,
        blink: Option<bool>,
    },
    Menu,
    Help,
}

struct Parsed {
    positional: Vec<String>,
    options: HashMap<String, String>,
    switches: HashSet<String>,
}

impl Parsed {
    fn take(&mut self, name: &str) -> Option<String> {
        self.options.remove(name)
    }

    fn expect_no_options(&self, command: &str) -> Result<()> {
        match self.options.keys().next() {
            Some(name) => bail!("unknown option --{name} for '{command}'"),
            None => Ok(()),
        }
    }
}

fn split(args: &[String], switches: &[&str]) -> Result<Parsed> {
    let mut parsed = Parsed {
        positional: Vec::new(),
        options: HashMap::new(),
        switches: HashSet::new(),
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let Some(name) = arg.strip_prefix("--") else {
            parsed.positional.push(arg.clone());
            continue;
        };

        if let Some((name, value)) = name.split_once('=') {
            parsed.options.insert(name.to_string(), value.to_string());
        } else if switches.contains(&name) {
            parsed.switches.insert(name.to_string());
        } else {
            let value = iter
                .next()
                .ok_or_else(|| anyhow!("option --{name} needs a value"))?;
            parsed.options.insert(name.to_string(), value.clone());
        }
    }
    Ok(parsed)
}

fn toggle(parsed: &mut Parsed, name: &str) -> Result<Option<bool>> {
    match parsed.take(name).as_deref() {
        None => Ok(None),
        Some("on") => Ok(Some(true)),
        Some("off") => Ok(Some(false)),
        Some(other) => bail!("--{name} expects 'on' or 'off', got '{other}'"),
    }
}

fn filter_from(parsed: &mut Parsed) -> DateFilter {
    DateFilter::new(parsed.take("search"), parsed.take("start"), parsed.take("end"))
}

/// Parse everything after the program name.
pub fn parse_args(args: &[String]) -> Result<Command> {
    let Some((name, rest)) = args.split_first() else {
        return Ok(Command::Help);
    };
    let mut parsed = split(rest, &["yes"])?;

    let command = match name.as_str() {
        "watch" => Command::Watch,
        "import" => {
            let file = parsed
                .positional
                .first()
                .ok_or_else(|| anyhow!("import needs a JSON file"))?;
            Command::Import {
                file: PathBuf::from(file),
            }
        }
        "record" => match parsed.positional.as_slice() {
            [date, key, json] => Command::Record {
                date: date.clone(),
                key: key.clone(),
                json: json.clone(),
            },
            _ => bail!("record needs <date> <key> <json>"),
        },
        "dates" => Command::Dates {
            filter: filter_from(&mut parsed),
        },
        "show" => Command::Show {
            date: parsed.positional.first().cloned(),
        },
        "export" => {
            let date = parsed
                .positional
                .first()
                .cloned()
                .ok_or_else(|| anyhow!("export needs a date"))?;
            Command::Export {
                date,
                out: parsed.take("out").map(PathBuf::from),
            }
        }
        "export-range" => Command::ExportRange {
            filter: filter_from(&mut parsed),
            out: parsed.take("out").map(PathBuf::from),
        },
        "login" => {
            let email = parsed
                .take("email")
                .ok_or_else(|| anyhow!("login needs --email"))?;
            if !email.contains('@') {
                bail!("'{email}' is not an email address");
            }
            let first = parsed.take("first").unwrap_or_default();
            let last = parsed.take("last").unwrap_or_default();
            let role = parsed.take("role");
            Command::Login {
                profile: UserProfile::new(&first, &last, &email, role.as_deref()),
            }
        }
        "logout" => Command::Logout {
            confirmed: parsed.switches.contains("yes"),
        },
        "notifications" => match parsed.positional.first().map(String::as_str) {
            Some("request") => Command::RequestNotifications,
            _ => bail!("usage: notifications request"),
        },
        "alerts" => {
            let threshold = match parsed.take("threshold") {
                Some(raw) => match raw.parse::<f64>() {
                    Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
                    _ => bail!("--threshold must be a non-negative number, got '{raw}'"),
                },
                None => None,
            };
            Command::Alerts {
                threshold,
                voice: toggle(&mut parsed, "voice")?,
                blink: toggle(&mut parsed, "blink")?,
            }
        }
        "menu" => Command::Menu,
        "help" | "-h" | "--help" => Command::Help,
        other => bail!("unknown command '{other}'\n\n{USAGE}"),
    };

    parsed.expect_no_options(name)?;
    Ok(command)
}

/// Yes/no question on the terminal; anything but `y`/`yes` is a no.
fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

struct TerminalPrompt;

impl PermissionPrompt for TerminalPrompt {
    fn ask(&self) -> NotificationPermission {
        match confirm("Allow pmwatch to show desktop notifications?") {
            Ok(true) => NotificationPermission::Granted,
            Ok(false) => NotificationPermission::Denied,
            // No answer could be read; ask again next time.
            Err(_) => NotificationPermission::Default,
        }
    }
}

fn dashboard(state: &AppState) -> DashboardController {
    let settings = state.settings.get();
    DashboardController::new(
        state.db.clone(),
        &settings,
        state.session.context(),
        NotificationDispatcher::platform(&settings.alerts),
    )
}

fn require_login(state: &AppState) -> Result<(), ViewError> {
    state.session.context().require_authenticated().map(|_| ())
}

fn out_dir(out: Option<PathBuf>) -> Result<PathBuf> {
    match out {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().context("failed to resolve the current directory"),
    }
}

pub async fn execute(command: Command, state: &AppState) -> Result<()> {
    match command {
        Command::Help => println!("{USAGE}"),
        Command::Watch => watch(state).await?,
        Command::Import { file } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let snapshot: Value = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;
            let summary = state.db.import_snapshot(&snapshot).await?;
            println!(
                "Imported {} records across {} days ({} skipped)",
                summary.entries, summary.days, summary.skipped
            );
        }
        Command::Record { date, key, json } => {
            let reading: Reading =
                serde_json::from_str(&json).context("reading must be a JSON object")?;
            state.db.put_reading(&date, &key, &reading).await?;
            println!("Stored env_logs/{date}/{key}");
        }
        Command::Dates { filter } => {
            require_login(state)?;
            let dates = export::list_dates(&state.db, &filter).await?;
            if dates.is_empty() {
                println!("No dates match the current filter.");
            }
            for date in dates {
                println!("{date}");
            }
        }
        Command::Show { date } => {
            require_login(state)?;
            show(state, date.as_deref()).await?;
        }
        Command::Export { date, out } => {
            require_login(state)?;
            let outcome = export::export_day(&state.db, &date, &out_dir(out)?).await?;
            println!("Downloaded {} successfully!", outcome.path.display());
        }
        Command::ExportRange { filter, out } => {
            require_login(state)?;
            let outcome = export::export_range(&state.db, &filter, &out_dir(out)?).await?;
            println!(
                "Downloaded {} containing data from {} filtered days successfully!",
                outcome.path.display(),
                outcome.days
            );
        }
        Command::Login { profile } => {
            let context = state.session.login(profile)?;
            let name = context
                .profile
                .as_ref()
                .map(UserProfile::display_name)
                .unwrap_or_default();
            println!("Welcome, {name}.");
        }
        Command::Logout { confirmed } => {
            if !state.session.context().is_authenticated() {
                println!("Not signed in.");
                return Ok(());
            }
            let confirmation = sidebar_items(&state.session.context())
                .into_iter()
                .find_map(|item| match item {
                    MenuItem::Guarded { confirmation, .. } => Some(confirmation),
                    MenuItem::Navigable { .. } => None,
                })
                .unwrap_or("Log out?");
            if confirmed || confirm(confirmation)? {
                state.session.logout()?;
                println!("Signed out.");
            }
        }
        Command::RequestNotifications => {
            require_login(state)?;
            let answer = dashboard(state)
                .request_notification_permission(&state.session, Arc::new(TerminalPrompt))
                .await?;
            println!("Notification permission: {answer:?}");
        }
        Command::Alerts {
            threshold,
            voice,
            blink,
        } => {
            let mut alerts = state.settings.get().alerts;
            if threshold.is_some() || voice.is_some() || blink.is_some() {
                alerts.threshold = threshold.unwrap_or(alerts.threshold);
                alerts.voice_enabled = voice.unwrap_or(alerts.voice_enabled);
                alerts.title_blink_enabled = blink.unwrap_or(alerts.title_blink_enabled);
                state.settings.update_alerts(alerts.clone())?;
                info!("Alert settings updated");
            }
            let flag = |on: bool| if on { "on" } else { "off" };
            println!(
                "Threshold {} pc/cm³, voice {}, title blink {}",
                format_count(alerts.threshold),
                flag(alerts.voice_enabled),
                flag(alerts.title_blink_enabled)
            );
        }
        Command::Menu => {
            for item in sidebar_items(&state.session.context()) {
                match item {
                    MenuItem::Navigable { label, path } => println!("{label:<10} {path}"),
                    MenuItem::Guarded {
                        label,
                        confirmation,
                        ..
                    } => println!("{label:<10} (asks: {confirmation})"),
                }
            }
        }
    }
    Ok(())
}

async fn show(state: &AppState, date: Option<&str>) -> Result<()> {
    let rows = match load_date_detail(&state.db, date).await {
        Ok(rows) => rows,
        Err(err) if err.redirects_to_listing() => {
            println!("No date selected; available dates:");
            for date in export::list_dates(&state.db, &DateFilter::default()).await? {
                println!("  {date}");
            }
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let mut header = vec!["Key".to_string()];
    header.extend(ReadingField::ALL.iter().map(|f| f.label().to_string()));
    println!("{}", header.join("\t"));

    for row in rows {
        let mut line = vec![row.key, row.display_time];
        line.extend(
            ReadingField::ALL[1..]
                .iter()
                .map(|&field| row.reading.field(field).unwrap_or_else(|| "-".into())),
        );
        println!("{}", line.join("\t"));
    }
    Ok(())
}

async fn watch(state: &AppState) -> Result<()> {
    let dashboard = dashboard(state);
    let mut updates = dashboard.subscribe();
    dashboard.start().await?;
    info!("Watching readings; type 'ack' to acknowledge, 'q' to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_rendered = String::new();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let text = render(&updates.borrow_and_update());
                if text != last_rendered {
                    println!("\n{text}");
                    last_rendered = text;
                }
            }
            line = lines.next_line() => {
                match line?.as_deref().map(str::trim) {
                    None | Some("q") | Some("quit") => break,
                    Some("ack") | Some("a") => {
                        if dashboard.acknowledge().await.is_none() {
                            println!("No pending alerts.");
                        }
                    }
                    Some("") => {}
                    Some(other) => println!("Unknown input '{other}'; use 'ack' or 'q'."),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    dashboard.shutdown().await
}
