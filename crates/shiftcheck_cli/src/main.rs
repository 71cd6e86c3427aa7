//! Command-line front end for the shift checklist.
//!
//! # Responsibility
//! - Resolve configuration from environment and flags.
//! - Map subcommands onto `ChecklistService` use-cases and print results.

mod render;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use log::info;
use shiftcheck_core::{
    active_log_dir, init_logging, ChecklistApi, ChecklistService, ClientConfig, EnginePolicy,
    FilterState, HttpChecklistApi, Lang, LineStatus, PreferenceStore, ScheduleEntry, Selector,
    SqlitePreferenceStore,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "shiftcheck", about = "Shift checklist client", version)]
struct Cli {
    /// API base URL, e.g. http://localhost:8000/api
    #[arg(long, value_name = "URL", global = true)]
    api_base: Option<String>,

    /// Checklist date (defaults to today)
    #[arg(long, value_name = "YYYY-MM-DD", global = true)]
    date: Option<NaiveDate>,

    /// Production line; stored as the new default
    #[arg(long, global = true)]
    line: Option<String>,

    /// Operator name; stored as the new default
    #[arg(long, global = true)]
    user: Option<String>,

    /// Absolute directory for rolling log files
    #[arg(long, value_name = "DIR", global = true)]
    log_dir: Option<PathBuf>,

    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Check that the API is reachable
    Ping,
    /// Show the visible checklist with progress
    List {
        #[arg(long)]
        process: Option<String>,
        #[arg(long)]
        equipment: Option<String>,
        /// Period in days, or `custom`
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Override "today" for the recurrence gate
        #[arg(long, value_name = "YYYY-MM-DD")]
        today: Option<NaiveDate>,
    },
    /// Toggle items for the current user and submit once
    Check {
        #[arg(required = true)]
        items: Vec<String>,
        /// Note stored on newly checked items
        #[arg(long)]
        note: Option<String>,
    },
    /// Replace the note on a checked item and submit
    Note { item: String, text: String },
    /// Submit the current day state unchanged
    Submit,
    /// Write the day state as CSV
    Export {
        /// Output file (defaults to checklist_checked_<date>_<line>.csv)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Upload a photo for an item
    Upload {
        item: String,
        file: PathBuf,
        /// MIME type; guessed from the extension when omitted
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Show or edit the line schedule
    Schedule {
        #[command(subcommand)]
        action: ScheduleCmd,
    },
    /// Per-day calendar summary for an inclusive range
    Summary {
        start: NaiveDate,
        end: NaiveDate,
        /// Compute from this line's day states instead of the server summary
        #[arg(long)]
        local: bool,
    },
    /// Show or change stored preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsCmd,
    },
}

#[derive(Subcommand, Debug)]
enum ScheduleCmd {
    Show,
    Set {
        /// running | planned_stop | maintenance | changeover | idle
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        schedule: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsCmd {
    Show,
    SetUser { name: String },
    SetLine { line: String },
    /// kr | en
    SetLang { lang: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    if let Err(err) = init_logging(&config) {
        eprintln!("warning: file logging disabled: {err}");
    }

    let date = cli.date.unwrap_or_else(|| Local::now().date_naive());
    let api = HttpChecklistApi::new(&config.api_base, config.timeout)?;
    let prefs = open_prefs(&config)?;
    let mut service = ChecklistService::new(api, prefs, date, EnginePolicy::default())?;

    if let Some(user) = &cli.user {
        service.set_user(user)?;
    }
    if let Some(line) = &cli.line {
        service.set_line(line)?;
    }
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&cli.cmd)
    );

    run(cli.cmd, &mut service).await
}

async fn run<A, P>(cmd: Cmd, service: &mut ChecklistService<A, P>) -> Result<()>
where
    A: ChecklistApi,
    P: PreferenceStore,
{
    match cmd {
        Cmd::Ping => {
            let status = service.api().health().await?;
            println!("api status={status} core={}", shiftcheck_core::core_version());
        }
        Cmd::List {
            process,
            equipment,
            period,
            category,
            today,
        } => {
            service.load().await?;
            service.set_filters(FilterState {
                process: selector(process),
                equipment: selector(equipment),
                period: selector(period),
                category: selector(category),
            })?;
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            print!("{}", render::checklist(service, today));
        }
        Cmd::Check { items, note } => {
            service.load().await?;
            for item_id in &items {
                let checked = service.toggle(item_id, note.clone())?;
                println!("{item_id}: {}", if checked { "checked" } else { "unchecked" });
            }
            service.submit().await?;
            println!("submitted {}", service.context().day_key());
        }
        Cmd::Note { item, text } => {
            service.load().await?;
            service.edit_note(&item, &text).await?;
            println!("note saved for {item}");
        }
        Cmd::Submit => {
            service.load().await?;
            service.submit().await?;
            println!("submitted {}", service.context().day_key());
        }
        Cmd::Export { out } => {
            service.load().await?;
            let export = service.export_csv().await?;
            let path = out.unwrap_or_else(|| PathBuf::from(&export.file_name));
            std::fs::write(&path, &export.bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        Cmd::Upload {
            item,
            file,
            content_type,
        } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let filename = file
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("photo")
                .to_string();
            let content_type = content_type.unwrap_or_else(|| guess_content_type(&filename).to_string());
            service.load().await?;
            let photo = service
                .upload_photo(&item, &filename, bytes, &content_type)
                .await?;
            service.submit().await?;
            println!("uploaded {} -> {}", photo.filename, photo.url);
        }
        Cmd::Schedule { action } => match action {
            ScheduleCmd::Show => {
                let entry = service.fetch_schedule().await?;
                print!("{}", render::schedule(&entry));
            }
            ScheduleCmd::Set {
                status,
                schedule,
                notes,
            } => {
                let mut entry: ScheduleEntry = service.fetch_schedule().await?;
                if let Some(value) = status {
                    let Some(parsed) = LineStatus::parse(&value) else {
                        bail!("unknown line status `{value}`");
                    };
                    entry.status = parsed;
                }
                if let Some(value) = schedule {
                    entry.schedule = value;
                }
                if let Some(value) = notes {
                    entry.notes = value;
                }
                let saved = service.save_schedule(entry).await?;
                print!("{}", render::schedule(&saved));
            }
        },
        Cmd::Summary { start, end, local } => {
            let summary = if local {
                service.load().await?;
                service.local_calendar_summary(start, end).await?
            } else {
                service.calendar_summary(start, end).await?
            };
            print!("{}", render::summary(&summary));
        }
        Cmd::Prefs { action } => {
            match action {
                PrefsCmd::Show => {}
                PrefsCmd::SetUser { name } => service.set_user(&name)?,
                PrefsCmd::SetLine { line } => service.set_line(&line)?,
                PrefsCmd::SetLang { lang } => {
                    let Some(parsed) = Lang::parse(&lang) else {
                        bail!("unknown language `{lang}`; expected kr or en");
                    };
                    service.set_lang(parsed)?;
                }
            }
            print!("{}", render::context(service.context(), active_log_dir()));
        }
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env()?;
    if let Some(api_base) = &cli.api_base {
        config.api_base = api_base.trim().to_string();
    }
    if let Some(log_dir) = &cli.log_dir {
        config.log_dir = Some(log_dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.trim().to_string();
    }
    config.validate()?;
    Ok(config)
}

fn open_prefs(config: &ClientConfig) -> Result<SqlitePreferenceStore> {
    let store = match &config.prefs_path {
        Some(path) => SqlitePreferenceStore::open(path)
            .with_context(|| format!("failed to open preferences at {}", path.display()))?,
        None => SqlitePreferenceStore::in_memory()?,
    };
    Ok(store)
}

fn selector(value: Option<String>) -> Selector {
    value.map(|value| Selector::parse(&value)).unwrap_or_default()
}

fn guess_content_type(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

fn command_name(cmd: &Cmd) -> &'static str {
    match cmd {
        Cmd::Ping => "ping",
        Cmd::List { .. } => "list",
        Cmd::Check { .. } => "check",
        Cmd::Note { .. } => "note",
        Cmd::Submit => "submit",
        Cmd::Export { .. } => "export",
        Cmd::Upload { .. } => "upload",
        Cmd::Schedule { .. } => "schedule",
        Cmd::Summary { .. } => "summary",
        Cmd::Prefs { .. } => "prefs",
    }
}

#[cfg(test)]
mod tests {
    use super::{guess_content_type, selector, Cli, Cmd, PrefsCmd};
    use clap::Parser;
    use shiftcheck_core::Selector;

    #[test]
    fn check_accepts_several_items_and_global_flags() {
        let cli = Cli::try_parse_from([
            "shiftcheck",
            "check",
            "item_1",
            "item_2",
            "--note",
            "ok",
            "--line",
            "Line2",
            "--date",
            "2024-01-07",
        ])
        .unwrap();

        assert_eq!(cli.line.as_deref(), Some("Line2"));
        assert_eq!(cli.date.unwrap().to_string(), "2024-01-07");
        match cli.cmd {
            Cmd::Check { items, note } => {
                assert_eq!(items, vec!["item_1", "item_2"]);
                assert_eq!(note.as_deref(), Some("ok"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn check_requires_an_item() {
        assert!(Cli::try_parse_from(["shiftcheck", "check"]).is_err());
    }

    #[test]
    fn prefs_set_lang_parses() {
        let cli = Cli::try_parse_from(["shiftcheck", "prefs", "set-lang", "en"]).unwrap();
        assert!(matches!(
            cli.cmd,
            Cmd::Prefs {
                action: PrefsCmd::SetLang { .. }
            }
        ));
    }

    #[test]
    fn summary_local_flag_parses() {
        let cli =
            Cli::try_parse_from(["shiftcheck", "summary", "2024-01-01", "2024-01-07", "--local"])
                .unwrap();
        assert!(matches!(cli.cmd, Cmd::Summary { local: true, .. }));
    }

    #[test]
    fn invalid_date_is_rejected() {
        assert!(Cli::try_parse_from(["shiftcheck", "list", "--date", "07/01/2024"]).is_err());
    }

    #[test]
    fn selector_and_content_type_helpers() {
        assert_eq!(selector(None), Selector::All);
        assert_eq!(selector(Some("all".to_string())), Selector::All);
        assert_eq!(
            selector(Some("Coater".to_string())),
            Selector::Only("Coater".to_string())
        );
        assert_eq!(guess_content_type("lamp.JPG"), "image/jpeg");
        assert_eq!(guess_content_type("notes"), "application/octet-stream");
    }
}
