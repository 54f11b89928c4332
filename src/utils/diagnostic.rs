//! Console report for mock configuration failures.

use std::path::Path;

use crate::errors::MockError;

/// Renders a failed compile the way it is shown on the console:
///
/// ```text
/// Failed to parse mock config.
///
/// Error in ./mock/index.yaml
/// <first message line>
///
/// <remaining lines>
/// ```
///
/// The file path may be absolute or relative to `cwd`; either way it is shown
/// relative to `cwd` and stripped from message lines. Lines that look like
/// stack frames (`at ...`) are dropped.
pub fn render_diagnostic(error: &MockError, file: &Path, cwd: &Path) -> String {
    let absolute = cwd.join(file);
    let shown = match absolute.strip_prefix(cwd) {
        Ok(relative) => format!("./{}", relative.display()),
        Err(_) => absolute.display().to_string(),
    };

    let prefix = match error {
        MockError::ConfigLoad { path, .. } => format!("{}: ", path.display()),
        _ => format!("{}: ", file.display()),
    };

    let message = error.to_string();
    let mut lines: Vec<String> = message
        .lines()
        .filter(|line| !line.trim_start().starts_with("at "))
        .map(|line| line.replace(&prefix, ""))
        .collect();
    if lines.len() > 1 {
        lines.insert(1, String::new());
    }

    let mut report = String::from("Failed to parse mock config.\n\n");
    report.push_str(&format!("Error in {}\n", shown));
    report.push_str(&lines.join("\n"));
    report.push('\n');
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_errors_show_relative_path_without_prefix() {
        let err = MockError::config_load("/proj/mock/index.yaml", "did not find expected key at line 3 column 1");
        let report = render_diagnostic(&err, Path::new("/proj/mock/index.yaml"), Path::new("/proj"));
        assert_eq!(
            report,
            "Failed to parse mock config.\n\nError in ./mock/index.yaml\ndid not find expected key at line 3 column 1\n"
        );
    }

    #[test]
    fn frame_lines_are_dropped() {
        let err = MockError::config_load(
            "/proj/mock/index.yaml",
            "boom\n    at load (/proj/mock/index.yaml:1)\ndetail",
        );
        let report = render_diagnostic(&err, Path::new("/proj/mock/index.yaml"), Path::new("/proj"));
        assert!(!report.contains("at load"));
        assert!(report.ends_with("boom\n\ndetail\n"));
    }

    #[test]
    fn paths_outside_cwd_stay_absolute() {
        let err = MockError::config_type("/x", "tagged value !sql");
        let report = render_diagnostic(&err, Path::new("/elsewhere/mock/index.yaml"), Path::new("/proj"));
        assert!(report.contains("Error in /elsewhere/mock/index.yaml\n"));
        assert!(report.contains("mock value of /x should be"));
    }

    #[test]
    fn relative_paths_are_resolved_against_cwd() {
        let err = MockError::config_load("mock/index.yaml", "did not find expected key");
        let report = render_diagnostic(&err, Path::new("mock/index.yaml"), Path::new("/proj"));
        assert!(report.contains("Error in ./mock/index.yaml\n"));
        assert!(report.ends_with("\ndid not find expected key\n"));
    }
}
