use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use offer_intake::config::{AppConfig, CacheConfig, EndpointConfig, WizardConfig};
use offer_intake::error::AppError;
use offer_intake::telemetry;
use offer_intake::workflows::enrolment::directory::{
    countries, filter_by_country, format_for_select, search, Agent, AgentOption, DirectoryCache,
    DirectoryError, DirectorySnapshot, DirectorySource,
};
use offer_intake::workflows::enrolment::mapper::{
    map_to_submission, project_flattened, validate_record, RecordValidation,
};
use offer_intake::workflows::enrolment::pipeline::offline::OfflineCollaborator;
use offer_intake::workflows::enrolment::{
    AttachedFile, Clock, Collaborators, DocumentSlot, DraftStore, EnrolmentWizard, FixedClock,
    FormValues, JsonFileDraftStore, MemoryDraftStore, PipelineRun, RestoreOutcome,
    SubmissionOrchestrator, SystemClock, ValidationError,
};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "offer-intake",
    about = "Preview, check, and dry-run enrolment offer submissions",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Map a form file to the submission record and run the record checks
    Preview(PreviewArgs),
    /// Run the wizard validation gate for one step or the whole form
    Check(CheckArgs),
    /// Run the full submission pipeline against offline collaborators
    DryRun(DryRunArgs),
    /// List agents from a directory snapshot file
    Agents(AgentsArgs),
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// JSON object of form field values
    #[arg(long)]
    form: PathBuf,
    /// Also print the flattened projection
    #[arg(long)]
    flattened: bool,
    /// Fixed RFC 3339 instant to map with (defaults to now)
    #[arg(long, value_parser = parse_instant)]
    now: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// JSON object of form field values, applied over any restored draft
    #[arg(long, required_unless_present = "draft")]
    form: Option<PathBuf>,
    /// Saved wizard draft to restore before validating
    #[arg(long)]
    draft: Option<PathBuf>,
    /// Step to validate (1-4); omit to validate every step
    #[arg(long)]
    step: Option<u8>,
    /// Fixed RFC 3339 instant to validate dates against
    #[arg(long, value_parser = parse_instant)]
    now: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
struct DryRunArgs {
    /// JSON object of form field values
    #[arg(long)]
    form: PathBuf,
    /// Documents to attach, as `slot=path` (e.g. `passport=scan.pdf`)
    #[arg(long = "files", value_parser = parse_attachment, num_args = 1..)]
    files: Vec<(DocumentSlot, PathBuf)>,
    /// Fixed RFC 3339 instant for the offer id and timestamps
    #[arg(long, value_parser = parse_instant)]
    now: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
struct AgentsArgs {
    /// JSON directory snapshot (`items`, `updatedAt`, `source`)
    #[arg(long)]
    directory: PathBuf,
    /// Keep agents from this country only
    #[arg(long)]
    country: Option<String>,
    /// Match against name, contact, and address
    #[arg(long)]
    search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PreviewOutput {
    record: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    flattened: Option<Value>,
    validation: RecordValidation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckOutput {
    step: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    draft: Option<String>,
    passed: bool,
    errors: Vec<ValidationError>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    missing_files: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DryRunOutput {
    run: PipelineRun,
    calls: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentsOutput {
    source: String,
    degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    countries: Vec<String>,
    agents: Vec<AgentOption>,
}

/// Directory snapshot read from disk on every fetch.
struct FileDirectorySource {
    path: PathBuf,
}

#[async_trait]
impl DirectorySource for FileDirectorySource {
    async fn fetch(&self, _force_refresh: bool) -> Result<DirectorySnapshot, DirectoryError> {
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|err| DirectoryError::Unavailable(format!("{}: {err}", self.path.display())))?;
        serde_json::from_str(&raw).map_err(|err| DirectoryError::Unavailable(err.to_string()))
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    info!(environment = ?config.environment, "offer intake cli started");

    let output = match cli.command {
        Command::Preview(args) => serde_json::to_string_pretty(&run_preview(args)?)?,
        Command::Check(args) => serde_json::to_string_pretty(&run_check(args, &config.wizard)?)?,
        Command::DryRun(args) => {
            serde_json::to_string_pretty(&run_dry_run(args, &config.endpoints).await?)?
        }
        Command::Agents(args) => {
            serde_json::to_string_pretty(&run_agents(args, &config.cache).await)?
        }
    };
    println!("{output}");
    Ok(())
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}

fn parse_attachment(raw: &str) -> Result<(DocumentSlot, PathBuf), String> {
    let (slot, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected slot=path, got '{raw}'"))?;
    let slot: DocumentSlot = serde_json::from_value(Value::String(slot.trim().to_string()))
        .map_err(|_| format!("unknown document slot '{slot}'"))?;
    Ok((slot, PathBuf::from(path.trim())))
}

fn clock_for(now: Option<DateTime<Utc>>) -> Arc<dyn Clock> {
    match now {
        Some(instant) => Arc::new(FixedClock::new(instant)),
        None => Arc::new(SystemClock),
    }
}

fn read_form(path: &Path) -> Result<FormValues, AppError> {
    let raw = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&raw)? {
        Value::Object(fields) => Ok(fields.into_iter().collect()),
        _ => Err(AppError::Input(format!(
            "{} must contain a JSON object of field values",
            path.display()
        ))),
    }
}

fn run_preview(args: PreviewArgs) -> Result<PreviewOutput, AppError> {
    let form = read_form(&args.form)?;
    let now = clock_for(args.now).now();

    let record = map_to_submission(&form, now);
    let validation = validate_record(&record);
    let flattened = if args.flattened {
        Some(serde_json::to_value(project_flattened(&record))?)
    } else {
        None
    };

    Ok(PreviewOutput {
        record: serde_json::to_value(&record)?,
        flattened,
        validation,
    })
}

fn restore_label(outcome: &RestoreOutcome) -> String {
    match outcome {
        RestoreOutcome::Fresh => "no draft found".to_string(),
        RestoreOutcome::Restored { saved_at } => format!("restored draft saved at {saved_at}"),
        RestoreOutcome::Expired { saved_at } => {
            format!("discarded expired draft saved at {saved_at}")
        }
        RestoreOutcome::Unreadable => "draft unreadable; ignored".to_string(),
    }
}

fn run_check(args: CheckArgs, settings: &WizardConfig) -> Result<CheckOutput, AppError> {
    let store: Arc<dyn DraftStore> = match &args.draft {
        Some(path) => Arc::new(JsonFileDraftStore::new(path)),
        None => Arc::new(MemoryDraftStore::new()),
    };
    let mut wizard = EnrolmentWizard::new(store, clock_for(args.now))
        .with_draft_expiry(settings.draft_expiry);
    let draft = args
        .draft
        .as_ref()
        .map(|_| restore_label(&wizard.initialize()));

    if let Some(path) = &args.form {
        for (name, value) in read_form(path)?.iter() {
            wizard.set_value(name.clone(), value.clone());
        }
    }

    let (errors, missing_files) = match args.step {
        Some(step) => (wizard.validate_step(step)?, Vec::new()),
        None => {
            let check = wizard.validate_all();
            let missing = check.missing_file_labels();
            (check.errors, missing)
        }
    };

    Ok(CheckOutput {
        step: args.step,
        draft,
        passed: errors.is_empty() && missing_files.is_empty(),
        errors,
        missing_files,
    })
}

async fn run_dry_run(
    args: DryRunArgs,
    endpoints: &EndpointConfig,
) -> Result<DryRunOutput, AppError> {
    let form = read_form(&args.form)?;
    let mut files = Vec::with_capacity(args.files.len());
    for (slot, path) in &args.files {
        files.push(AttachedFile {
            slot: *slot,
            filename: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            content_type: None,
            bytes: std::fs::read(path)?,
        });
    }

    let offline = Arc::new(OfflineCollaborator::from_endpoints(endpoints));
    let collaborators = Collaborators {
        validation: offline.clone(),
        submission: offline.clone(),
        notification: offline.clone(),
        files: offline.clone(),
    };
    let orchestrator = SubmissionOrchestrator::new(collaborators, clock_for(args.now));
    let run = orchestrator.submit(&form, &files).await;

    Ok(DryRunOutput {
        run,
        calls: offline
            .calls()
            .into_iter()
            .map(|call| format!("{}: {}", call.stage, call.summary))
            .collect(),
    })
}

async fn run_agents(args: AgentsArgs, settings: &CacheConfig) -> AgentsOutput {
    let cache = DirectoryCache::with_ttl(
        Arc::new(FileDirectorySource {
            path: args.directory,
        }),
        Arc::new(SystemClock),
        settings.directory_ttl,
    );
    let response = cache.get(false).await;
    let items = &response.snapshot.items;

    let in_country: Vec<Agent> = filter_by_country(items, args.country.as_deref())
        .into_iter()
        .cloned()
        .collect();
    let matches: Vec<Agent> = search(&in_country, args.search.as_deref().unwrap_or_default())
        .into_iter()
        .cloned()
        .collect();

    AgentsOutput {
        source: response.snapshot.source.clone(),
        degraded: response.degraded,
        error: response.error.clone(),
        countries: countries(items),
        agents: format_for_select(&matches),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offer_intake::workflows::enrolment::PipelineStage;
    use serde_json::json;
    use std::fs;

    fn write_form(dir: &tempfile::TempDir, form: Value) -> PathBuf {
        let path = dir.path().join("form.json");
        fs::write(&path, serde_json::to_string(&form).expect("form serializes"))
            .expect("write form");
        path
    }

    fn wizard_settings() -> WizardConfig {
        WizardConfig {
            draft_expiry: std::time::Duration::from_secs(24 * 60 * 60),
            autosave_interval: std::time::Duration::from_secs(30),
        }
    }

    fn fixed_now() -> Option<DateTime<Utc>> {
        Some(parse_instant("2025-10-01T09:30:15Z").expect("valid instant"))
    }

    fn applicant() -> Value {
        json!({
            "firstName": "Ana",
            "familyName": "Lee",
            "email": "ana.lee@example.com",
            "dateOfBirth": "1999-04-12",
            "countryOfBirth": "Korea, Republic of",
            "nationality": "South Korean",
            "passportNumber": "M12345678",
            "hasPostalAddress": "No"
        })
    }

    #[test]
    fn preview_maps_and_validates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = run_preview(PreviewArgs {
            form: write_form(&dir, applicant()),
            flattened: true,
            now: fixed_now(),
        })
        .expect("preview runs");

        assert!(output.validation.is_valid);
        assert_eq!(output.record["OfferId"], "OFFER_20251001_093015");
        let flattened = output.flattened.expect("flattened requested");
        assert_eq!(flattened["PostalAddress"], Value::Null);
    }

    #[test]
    fn check_reports_step_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = run_check(
            CheckArgs {
                form: Some(write_form(&dir, json!({ "firstName": "A" }))),
                draft: None,
                step: Some(1),
                now: fixed_now(),
            },
            &wizard_settings(),
        )
        .expect("check runs");

        assert!(!output.passed);
        let first_name = output
            .errors
            .iter()
            .find(|error| error.field == "firstName")
            .expect("first name flagged");
        assert_eq!(first_name.message, "First name must be at least 2 characters");
    }

    #[test]
    fn check_rejects_unknown_steps_and_non_objects() {
        let dir = tempfile::tempdir().expect("tempdir");
        let form = write_form(&dir, applicant());
        assert!(matches!(
            run_check(
                CheckArgs {
                    form: Some(form),
                    draft: None,
                    step: Some(9),
                    now: fixed_now(),
                },
                &wizard_settings(),
            ),
            Err(AppError::Wizard(_))
        ));

        let list = write_form(&dir, json!(["not", "an", "object"]));
        assert!(matches!(read_form(&list), Err(AppError::Input(_))));
    }

    #[test]
    fn check_restores_a_saved_draft_before_validating() {
        let dir = tempfile::tempdir().expect("tempdir");
        let draft = dir.path().join("draft.json");
        fs::write(
            &draft,
            serde_json::to_string(&json!({
                "stepIndex": 1,
                "completedSteps": [],
                "formValues": { "firstName": "Ana", "familyName": "Lee" },
                "savedAt": "2025-10-01T08:00:00Z"
            }))
            .expect("draft serializes"),
        )
        .expect("write draft");

        let output = run_check(
            CheckArgs {
                form: None,
                draft: Some(draft),
                step: Some(1),
                now: fixed_now(),
            },
            &wizard_settings(),
        )
        .expect("check runs");

        assert!(output
            .draft
            .as_deref()
            .is_some_and(|label| label.starts_with("restored draft")));
        assert!(!output.errors.iter().any(|error| error.field == "firstName"));
        assert!(output.errors.iter().any(|error| error.field == "email"));
    }

    #[tokio::test]
    async fn agents_filter_by_country_and_search_term() {
        let dir = tempfile::tempdir().expect("tempdir");
        let directory = dir.path().join("agents.json");
        fs::write(
            &directory,
            serde_json::to_string(&json!({
                "items": [
                    { "name": "Acme Education", "country": "India", "address": "Pune" },
                    { "name": "Bright Path", "country": "India", "address": "Delhi" },
                    { "name": "Harbour Study", "country": "Vietnam", "address": "Hanoi" }
                ],
                "updatedAt": "2025-10-01T08:00:00Z",
                "source": "remote"
            }))
            .expect("directory serializes"),
        )
        .expect("write directory");
        let settings = CacheConfig {
            directory_ttl: std::time::Duration::from_secs(120),
        };

        let output = run_agents(
            AgentsArgs {
                directory,
                country: Some("india".to_string()),
                search: Some("delhi".to_string()),
            },
            &settings,
        )
        .await;
        assert!(!output.degraded);
        assert_eq!(output.countries, vec!["India", "Vietnam"]);
        assert_eq!(output.agents.len(), 1);
        assert_eq!(output.agents[0].value, "Bright Path|India");

        let missing = run_agents(
            AgentsArgs {
                directory: dir.path().join("absent.json"),
                country: None,
                search: None,
            },
            &settings,
        )
        .await;
        assert!(missing.degraded);
        assert_eq!(missing.source, "fallback");
    }

    #[test]
    fn attachment_arguments_name_a_slot() {
        let (slot, path) = parse_attachment("passport=scans/passport.pdf").expect("parses");
        assert_eq!(slot, DocumentSlot::Passport);
        assert_eq!(path, PathBuf::from("scans/passport.pdf"));
        assert!(parse_attachment("passport.pdf").is_err());
        assert!(parse_attachment("selfie=me.png").is_err());
    }

    #[tokio::test]
    async fn dry_run_completes_offline() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scan = dir.path().join("passport.pdf");
        fs::write(&scan, b"%PDF-1.7").expect("write scan");
        let endpoints = EndpointConfig {
            validation_api: Some("https://cricos.example/validate".to_string()),
            submission_api: Some("https://cricos.example/offers".to_string()),
            notification_flow: Some("https://flows.example/notify".to_string()),
            file_forward: Some("https://flows.example/files".to_string()),
        };

        let output = run_dry_run(
            DryRunArgs {
                form: write_form(&dir, applicant()),
                files: vec![(DocumentSlot::Passport, scan)],
                now: fixed_now(),
            },
            &endpoints,
        )
        .await
        .expect("dry run");

        assert!(output.run.is_complete());
        assert_eq!(output.calls.len(), 4);
        assert!(output.calls[3].starts_with("forward-files: forward 1 file(s)"));
        assert!(output.calls[3].contains("Ana Lee's Material Upload"));
        assert_eq!(
            output.run.status(PipelineStage::Complete),
            offer_intake::workflows::enrolment::StageStatus::Completed
        );
    }

    #[tokio::test]
    async fn dry_run_without_a_validation_endpoint_stops_before_any_call() {
        let dir = tempfile::tempdir().expect("tempdir");

        let output = run_dry_run(
            DryRunArgs {
                form: write_form(&dir, applicant()),
                files: Vec::new(),
                now: fixed_now(),
            },
            &EndpointConfig::default(),
        )
        .await
        .expect("dry run");

        assert!(!output.run.is_complete());
        assert!(output.calls.is_empty());
        assert_eq!(
            output.run.failed_stage(),
            Some(PipelineStage::ExternalValidate)
        );
        let error = output
            .run
            .error(PipelineStage::ExternalValidate)
            .expect("validate error");
        assert_eq!(error.message, "Validation API is not configured");
        for later in [
            PipelineStage::ExternalSubmit,
            PipelineStage::Notify,
            PipelineStage::ForwardFiles,
            PipelineStage::Complete,
        ] {
            assert_eq!(
                output.run.status(later),
                offer_intake::workflows::enrolment::StageStatus::Pending
            );
        }
    }
}
