//! `tenecs tests` - list the tests and entry points of a package.

use super::files;
use crate::output::{report_errors, StyledOutput, Summary};
use crate::Format;
use tenecs_engine::{check_files, CheckerConfig, Ref};
use termcolor::ColorChoice;

pub fn execute(paths: &[String], config: &CheckerConfig, format: Format, color: ColorChoice) -> anyhow::Result<bool> {
    let loaded = files::load_all(paths)?;
    let result = check_files(loaded.iter().map(|l| l.file.clone()).collect(), config);

    if format == Format::Json {
        Summary::from_result(&result).print()?;
        return Ok(result.is_ok());
    }

    let mut out = StyledOutput::new(color);
    let output = match &result {
        Ok(output) => output,
        Err(errors) => {
            report_errors(&mut out, errors, &loaded, format);
            return Ok(false);
        }
    };

    let sections: [(&str, &[Ref]); 5] = [
        ("unit tests", &output.tests.unit_tests),
        ("unit test suites", &output.tests.unit_test_suites),
        ("go integration tests", &output.tests.go_integration_tests),
        ("go main", &output.runnables.go_main),
        ("web apps", &output.runnables.web_web_app),
    ];
    for (title, refs) in sections {
        if refs.is_empty() {
            continue;
        }
        out.heading(title);
        for r in refs {
            out.line(&format!("  {}", r));
        }
    }
    if output.tests.is_empty() {
        out.line("no tests found");
    }
    Ok(true)
}
