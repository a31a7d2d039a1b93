use std::cell::Cell;
use std::path::Path;

use auto_impl::auto_impl;
use console::{style, Term};

use crate::project::Project;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// A step has started. The next report replaces it, if the reporter can do that.
    Running,
    Failed,
    Done,
    Warning,
}

#[auto_impl(&, Box)]
pub trait Reporter {
    fn report(&self, status: Status, message: &str);
}

/// Formats the progress lines for bundling one project into one place.
pub struct Progress {
    header: String,
    done: String,
}

impl Progress {
    pub fn new(project: &Project, path: &Path) -> Progress {
        let what = format!(
            "{} ({}) into {}",
            project.name,
            project.version,
            path.display()
        );
        Progress {
            header: format!("Bundling {what}"),
            done: format!("Bundled {what}"),
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn step(&self, message: &str) -> String {
        format!("{}: {}", self.header, message)
    }

    pub fn failed(&self, step: &str) -> String {
        self.step(&format!("Failed at step {step}"))
    }

    pub fn done(&self) -> &str {
        &self.done
    }
}

/// Writes progress to stderr. On a terminal each running step replaces the one
/// before it, so a successful bundle ends up as a single line.
pub struct ConsoleReporter {
    term: Term,
    overwrite: bool,
    pending_running: Cell<bool>,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> ConsoleReporter {
        let term = Term::stderr();
        let overwrite = term.is_term() && !verbose;
        ConsoleReporter {
            term,
            overwrite,
            pending_running: Cell::new(false),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, status: Status, message: &str) {
        let line = match status {
            Status::Running => format!("  {} {}", style("•").for_stderr().blue(), message),
            Status::Failed => format!("  {} {}", style("•").for_stderr().red(), message),
            Status::Done => format!("  {} {}", style("•").for_stderr().green(), message),
            Status::Warning => format!(
                "  {} {}",
                style("•").for_stderr().yellow().bold(),
                style(message).for_stderr().yellow()
            ),
        };
        // a failure keeps whatever the failing step printed
        let replaces = matches!(status, Status::Running | Status::Done);
        if self.overwrite && self.pending_running.get() && replaces {
            // ignore write errors: if stderr is gone there's nobody to tell
            self.term.clear_last_lines(1).ok();
        }
        self.term.write_line(&line).ok();
        self.pending_running.set(status == Status::Running);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::simple_project;

    #[test]
    fn test_progress_messages() {
        let project = simple_project();
        let progress = Progress::new(&project, Path::new("/tmp/bundle"));
        assert_eq!(
            progress.header(),
            "Bundling simple-project (1.2.3) into /tmp/bundle"
        );
        assert_eq!(
            progress.step("Installing dependencies"),
            "Bundling simple-project (1.2.3) into /tmp/bundle: Installing dependencies"
        );
        assert_eq!(
            progress.failed("Installing dependencies"),
            "Bundling simple-project (1.2.3) into /tmp/bundle: Failed at step Installing dependencies"
        );
        assert_eq!(
            progress.done(),
            "Bundled simple-project (1.2.3) into /tmp/bundle"
        );
    }
}
