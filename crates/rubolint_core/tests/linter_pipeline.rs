//! Integration tests for the analyze and auto-correct pipeline.
//!
//! A shell script stands in for RuboCop so the tests run without Ruby.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pretty_assertions::assert_eq;
use rubolint_core::command::BundlerDetector;
use rubolint_core::{
    Diagnostic, Document, FixTrigger, Linter, LinterConfig, NotificationKind, Range,
    RecordingNotifier, Severity,
};
use tempfile::TempDir;

const OFFENSES: &str = r#"{"metadata":{"rubocop_version":"1.50.2"},"files":[{"path":"app.rb","offenses":[{"severity":"convention","message":"Prefer single-quoted strings. (https://rubystyle.guide#consistent-string-literals)","cop_name":"Style/StringLiterals","corrected":false,"location":{"line":2,"column":7,"length":14}},{"severity":"warning","message":"Useless assignment to variable - `x`.","cop_name":"Lint/UselessAssignment","corrected":false,"location":{"line":3,"column":1,"length":1}}]}],"summary":{"offense_count":2}}"#;

const CLEAN: &str = r#"{"metadata":{"rubocop_version":"1.50.2"},"files":[{"path":"app.rb","offenses":[]}],"summary":{"offense_count":0}}"#;

struct Project {
    dir: TempDir,
    notifier: RecordingNotifier,
}

impl Project {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            notifier: RecordingNotifier::new(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Installs an executable script named `rubocop` and returns its path.
    fn fake_rubocop(&self, body: &str) -> PathBuf {
        let script = self.path("rubocop");
        fs::write(&script, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    /// A script that prints `json` and records its arguments.
    fn rubocop_printing(&self, json: &str) -> PathBuf {
        let args = self.path("args.txt");
        self.fake_rubocop(&format!(
            "printf '%s\\n' \"$@\" > '{}'\ncat <<'EOF'\n{}\nEOF",
            args.display(),
            json
        ))
    }

    fn recorded_args(&self) -> Vec<String> {
        fs::read_to_string(self.path("args.txt"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn source(&self, name: &str, text: &str) -> PathBuf {
        let file = self.path(name);
        fs::write(&file, text).unwrap();
        file
    }

    fn linter(&self, command: &Path) -> Linter {
        let mut config = LinterConfig::new();
        config.command = command.to_string_lossy().into_owned();
        config.timeout_ms = 5_000;
        Linter::new(config, Arc::new(self.notifier.clone())).with_project_root(self.dir.path())
    }
}

#[tokio::test]
async fn analyze_translates_offenses_in_order() {
    let project = Project::new();
    let rubocop = project.rubocop_printing(OFFENSES);
    let file = project.source("app.rb", "x = 1\nputs \"hello world\"\nx = 2\n");

    let diags = project
        .linter(&rubocop)
        .analyze(&Document::saved(&file, "x = 1\n"))
        .await
        .unwrap();

    assert_eq!(diags.len(), 2);
    assert_eq!(
        diags[0].excerpt,
        "Style/StringLiterals: Prefer single-quoted strings."
    );
    assert_eq!(
        diags[0].url.as_deref(),
        Some("https://rubystyle.guide#consistent-string-literals")
    );
    assert_eq!(diags[0].severity, Severity::Info);
    assert_eq!(diags[1].cop_name.as_deref(), Some("Lint/UselessAssignment"));
    assert_eq!(diags[1].severity, Severity::Warning);
    assert_eq!(diags[1].location.file, file);
}

#[tokio::test]
async fn saved_buffer_passes_path_without_stdin() {
    let project = Project::new();
    let rubocop = project.rubocop_printing(CLEAN);
    let file = project.source("app.rb", "puts 1\n");

    let diags = project
        .linter(&rubocop)
        .analyze(&Document::saved(&file, "puts 1\n"))
        .await
        .unwrap();

    assert!(diags.is_empty());
    let args = project.recorded_args();
    assert_eq!(
        args,
        vec![
            "--force-exclusion".to_string(),
            "--format".to_string(),
            "json".to_string(),
            "--display-style-guide".to_string(),
            "--cache".to_string(),
            "false".to_string(),
            file.to_string_lossy().into_owned(),
        ]
    );
}

#[tokio::test]
async fn modified_buffer_is_sent_on_stdin() {
    let project = Project::new();
    let received = project.path("stdin.txt");
    let rubocop = project.fake_rubocop(&format!(
        "printf '%s\\n' \"$@\" > '{}'\ncat > '{}'\ncat <<'EOF'\n{}\nEOF",
        project.path("args.txt").display(),
        received.display(),
        CLEAN
    ));
    let file = project.path("unsaved.rb");

    let diags = project
        .linter(&rubocop)
        .analyze(&Document::modified(&file, "puts \"edited\"\n"))
        .await
        .unwrap();

    assert!(diags.is_empty());
    assert_eq!(fs::read_to_string(&received).unwrap(), "puts \"edited\"\n");
    let args = project.recorded_args();
    let tail = &args[args.len() - 2..];
    assert_eq!(tail, &["--stdin".to_string(), file.to_string_lossy().into_owned()]);
}

#[tokio::test]
async fn buffer_without_path_is_skipped() {
    let project = Project::new();
    let rubocop = project.rubocop_printing(CLEAN);
    let buffer = Document {
        path: None,
        text: "puts 1\n".to_string(),
        modified: true,
    };

    assert_eq!(project.linter(&rubocop).analyze(&buffer).await, None);
    assert!(project.recorded_args().is_empty());
}

#[tokio::test]
async fn unparseable_output_becomes_top_of_file_error() {
    let project = Project::new();
    let rubocop = project.fake_rubocop("echo 'Error: unrecognized cop Foo/Bar' >&2");
    let file = project.source("app.rb", "puts 1\n");

    let diags = project
        .linter(&rubocop)
        .analyze(&Document::saved(&file, "puts 1\n"))
        .await
        .unwrap();

    assert_eq!(
        diags,
        vec![Diagnostic::top_of_file_error(
            &file,
            "Error: unrecognized cop Foo/Bar\n"
        )]
    );
    assert_eq!(diags[0].location.position, Range::TOP_OF_FILE);
    assert_eq!(diags[0].severity, Severity::Error);
}

#[tokio::test]
async fn missing_version_becomes_top_of_file_error() {
    let project = Project::new();
    let rubocop = project.rubocop_printing(r#"{"metadata":{},"files":[{"offenses":[]}]}"#);
    let file = project.source("app.rb", "puts 1\n");

    let diags = project
        .linter(&rubocop)
        .analyze(&Document::saved(&file, "puts 1\n"))
        .await
        .unwrap();

    assert_eq!(diags.len(), 1);
    assert_eq!(
        diags[0].excerpt,
        "Unable to get rubocop version from linting output results."
    );
}

#[tokio::test]
async fn missing_rubocop_config_disables_linting() {
    let project = Project::new();
    let rubocop = project.rubocop_printing(OFFENSES);
    let file = project.source("app.rb", "puts 1\n");
    let linter = project.linter(&rubocop);
    linter.update_config(|c| c.disable_when_no_config_file = true);

    let diags = linter.analyze(&Document::saved(&file, "puts 1\n")).await;

    assert_eq!(diags, Some(Vec::new()));
    assert!(project.recorded_args().is_empty());

    fs::write(project.path(".rubocop.yml"), "AllCops:\n  NewCops: enable\n").unwrap();
    let diags = linter.analyze(&Document::saved(&file, "puts 1\n")).await;
    assert_eq!(diags.map(|d| d.len()), Some(2));
}

#[tokio::test]
async fn empty_command_is_reported_on_the_file() {
    let project = Project::new();
    let file = project.source("app.rb", "puts 1\n");
    let linter = project.linter(Path::new("   "));

    let diags = linter
        .analyze(&Document::saved(&file, "puts 1\n"))
        .await
        .unwrap();

    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].location.position, Range::TOP_OF_FILE);
    assert!(diags[0].excerpt.contains("no rubocop command configured"));
}

#[tokio::test]
async fn missing_executable_notifies_and_leaves_diagnostics() {
    let project = Project::new();
    let file = project.source("app.rb", "puts 1\n");
    let linter = project.linter(&project.path("no-such-rubocop"));

    let diags = linter.analyze(&Document::saved(&file, "puts 1\n")).await;

    assert_eq!(diags, None);
    let notes = project.notifier.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, NotificationKind::Error);
    assert_eq!(notes[0].message, "Rubocop: Unexpected error");
    assert!(notes[0].description.is_some());
}

#[tokio::test]
async fn timeout_notifies_once() {
    let project = Project::new();
    let rubocop = project.fake_rubocop("sleep 5");
    let file = project.source("app.rb", "puts 1\n");
    let linter = project.linter(&rubocop);
    linter.update_config(|c| c.timeout_ms = 100);

    let diags = linter.analyze(&Document::saved(&file, "puts 1\n")).await;

    assert_eq!(diags, None);
    let notes = project.notifier.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].message, "Linter-Rubocop: Linter timed out");
}

#[tokio::test]
async fn project_settings_override_command() {
    let project = Project::new();
    let rubocop = project.rubocop_printing(CLEAN);
    let file = project.source("app.rb", "puts 1\n");
    fs::write(
        project.path(".rubolint.json"),
        format!(r#"{{"command": "{} --only Style", "useRubocopCache": true}}"#, rubocop.display()),
    )
    .unwrap();
    let linter = project.linter(&project.path("no-such-rubocop"));

    let diags = linter.analyze(&Document::saved(&file, "puts 1\n")).await;

    assert_eq!(diags, Some(Vec::new()));
    let args = project.recorded_args();
    assert_eq!(&args[..2], &["--only".to_string(), "Style".to_string()]);
    assert!(!args.contains(&"--cache".to_string()));
}

fn fix_output(total: usize, corrected: usize) -> String {
    let offenses: Vec<String> = (0..total)
        .map(|i| {
            format!(
                r#"{{"severity":"convention","message":"m{}","cop_name":"Style/X","corrected":{},"location":{{"line":1,"column":1,"length":1}}}}"#,
                i,
                i < corrected
            )
        })
        .collect();
    format!(
        r#"{{"metadata":{{"rubocop_version":"1.50.2"}},"files":[{{"path":"app.rb","offenses":[{}]}}],"summary":{{"offense_count":{}}}}}"#,
        offenses.join(","),
        total
    )
}

#[tokio::test]
async fn autocorrect_reports_full_fix() {
    let project = Project::new();
    let rubocop = project.rubocop_printing(&fix_output(5, 5));
    let file = project.source("app.rb", "puts \"a\"\n");

    let summary = project
        .linter(&rubocop)
        .autocorrect(&Document::saved(&file, "puts \"a\"\n"), FixTrigger::Command)
        .await
        .unwrap();

    assert_eq!(summary.offense_count, 5);
    assert_eq!(summary.corrected, 5);
    let args = project.recorded_args();
    let tail = &args[args.len() - 2..];
    assert_eq!(tail, &["--auto-correct".to_string(), file.to_string_lossy().into_owned()]);

    let notes = project.notifier.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, NotificationKind::Success);
    assert_eq!(notes[0].message, "Linter-Rubocop: Fixed 5 offenses of 5");
}

#[tokio::test]
async fn autocorrect_reports_partial_fix_as_info() {
    let project = Project::new();
    let rubocop = project.rubocop_printing(&fix_output(3, 1));
    let file = project.source("app.rb", "puts \"a\"\n");

    let summary = project
        .linter(&rubocop)
        .autocorrect(&Document::saved(&file, "puts \"a\"\n"), FixTrigger::Command)
        .await
        .unwrap();

    assert_eq!(summary.corrected, 1);
    let notes = project.notifier.notifications();
    assert_eq!(notes[0].kind, NotificationKind::Info);
    assert_eq!(notes[0].message, "Linter-Rubocop: Fixed 1 offense of 3");
}

#[tokio::test]
async fn autocorrect_without_offenses() {
    let project = Project::new();
    let rubocop = project.rubocop_printing(CLEAN);
    let file = project.source("app.rb", "puts 1\n");

    project
        .linter(&rubocop)
        .autocorrect(&Document::saved(&file, "puts 1\n"), FixTrigger::Command)
        .await
        .unwrap();

    let notes = project.notifier.notifications();
    assert_eq!(notes[0].kind, NotificationKind::Info);
    assert_eq!(notes[0].message, "Linter-Rubocop: No fixes were made");
}

#[tokio::test]
async fn autocorrect_on_save_is_quiet_on_success() {
    let project = Project::new();
    let rubocop = project.rubocop_printing(&fix_output(2, 2));
    let file = project.source("app.rb", "puts \"a\"\n");

    let summary = project
        .linter(&rubocop)
        .autocorrect(&Document::saved(&file, "puts \"a\"\n"), FixTrigger::Save)
        .await;

    assert!(summary.is_some());
    assert!(project.notifier.notifications().is_empty());
}

#[tokio::test]
async fn autocorrect_refuses_unsaved_and_empty_buffers() {
    let project = Project::new();
    let rubocop = project.rubocop_printing(CLEAN);
    let file = project.source("app.rb", "");
    let linter = project.linter(&rubocop);

    let unsaved = linter
        .autocorrect(&Document::modified(&file, "puts 1\n"), FixTrigger::Command)
        .await;
    let empty = linter
        .autocorrect(&Document::saved(&file, ""), FixTrigger::Command)
        .await;

    assert_eq!(unsaved, None);
    assert_eq!(empty, None);
    let messages: Vec<_> = project
        .notifier
        .notifications()
        .into_iter()
        .map(|n| (n.kind, n.message))
        .collect();
    assert_eq!(
        messages,
        vec![
            (
                NotificationKind::Error,
                "Linter-Rubocop: Please save before fix file".to_string()
            ),
            (
                NotificationKind::Error,
                "Linter-Rubocop: Nothing to fix in an empty file".to_string()
            ),
        ]
    );
    assert!(project.recorded_args().is_empty());
}

#[tokio::test]
async fn autocorrect_parse_failure_is_reported() {
    let project = Project::new();
    let rubocop = project.fake_rubocop("echo 'cannot load such file -- rubocop-rails' >&2");
    let file = project.source("app.rb", "puts 1\n");

    let summary = project
        .linter(&rubocop)
        .autocorrect(&Document::saved(&file, "puts 1\n"), FixTrigger::Command)
        .await;

    assert_eq!(summary, None);
    let notes = project.notifier.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, NotificationKind::Error);
    assert_eq!(notes[0].message, "Rubocop: Parse error");
    assert_eq!(
        notes[0].description.as_deref(),
        Some("cannot load such file -- rubocop-rails\n")
    );
}

#[tokio::test(flavor = "current_thread")]
async fn analyze_keeps_runtime_responsive_while_detecting_bundler() {
    let project = Project::new();
    let rubocop = project.rubocop_printing(CLEAN);
    let file = project.source("app.rb", "x = 1\n");
    fs::write(project.path("Gemfile"), "gem 'rubocop'\n").unwrap();

    let bundle = project.path("bundle");
    fs::write(&bundle, "#!/bin/sh\nsleep 1\nexit 1\n").unwrap();
    fs::set_permissions(&bundle, fs::Permissions::from_mode(0o755)).unwrap();

    let linter = project
        .linter(&rubocop)
        .with_bundler(BundlerDetector::new().with_program(bundle.to_string_lossy()));

    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker = {
        let ticks = ticks.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(10)).await;
                ticks.fetch_add(1, Ordering::Relaxed);
            }
        })
    };

    let diagnostics = linter.analyze(&Document::saved(&file, "x = 1\n")).await;
    ticker.abort();

    assert_eq!(diagnostics, Some(vec![]));
    assert!(ticks.load(Ordering::Relaxed) > 40, "runtime was stalled");
    // Not bundled, so rubocop ran directly.
    assert_eq!(project.recorded_args().first().map(String::as_str), Some("--force-exclusion"));
}
