//! `tenecs check` - type-check a package.

use super::files;
use crate::output::{report_errors, StyledOutput, Summary};
use crate::Format;
use tenecs_engine::{check_files, CheckerConfig};
use termcolor::ColorChoice;

/// Returns whether the package checked cleanly
pub fn execute(paths: &[String], config: &CheckerConfig, format: Format, color: ColorChoice) -> anyhow::Result<bool> {
    let loaded = files::load_all(paths)?;
    let result = check_files(loaded.iter().map(|l| l.file.clone()).collect(), config);

    if format == Format::Json {
        Summary::from_result(&result).print()?;
        return Ok(result.is_ok());
    }

    let mut out = StyledOutput::new(color);
    match &result {
        Ok(output) => {
            for declaration in &output.program.declarations {
                out.line(&format!("{}: {}", declaration.name, declaration.variable_type()));
            }
            out.success(&format!(
                "checked package {} ({} declarations)",
                output.program.package,
                output.program.declarations.len()
            ));
        }
        Err(errors) => report_errors(&mut out, errors, &loaded, format),
    }
    Ok(result.is_ok())
}
