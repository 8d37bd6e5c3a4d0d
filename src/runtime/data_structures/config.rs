use crate::runtime::error::{self, ErrorKind, ScriptError};
use std::fs::{read_to_string, write};

/// Name of the configuration file within the data directory.
pub const CONFIG_FILE_NAME: &str = "config.txt";

/// Smallest and largest tolerance accepted for integration and root finding.
pub const TOLERANCE_RANGE: (f64, f64) = (1e-10, 1e-2);

/// Deepest expansion nesting a config file may ask for.
pub const MAX_RECURSION_LIMIT: usize = 1024;

/// Largest number of digits the stack printer will show.
pub const MAX_PRINT_PRECISION: usize = 20;

/// The calculator's user settings.  Persisted as a `key = value` text file, one setting per line.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Digits shown after the decimal point, or significant digits in scientific mode.
    pub print_precision: usize,

    /// Fixed point display when true, general/scientific display otherwise.
    pub fixed_point: bool,

    /// Print informational messages, such as newly defined words.
    pub verbose_mode: bool,

    /// Index of the user word used by `integrate` and `fzero`.
    pub selected_function: usize,

    /// Where the macro, config, register and word files live.  Also searched for matrix, batch
    /// and program files.
    pub path_to_data_and_programs: String,

    /// How deeply word, macro and script expansion may nest.
    pub recursion_limit: usize,

    /// Relative tolerance for `integrate`.
    pub integration_tolerance: f64,

    /// Interval width at which `fzero` stops.
    pub root_tolerance: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            print_precision: 6,
            fixed_point: true,
            verbose_mode: false,
            selected_function: 0,
            path_to_data_and_programs: ".".to_string(),
            recursion_limit: 64,
            integration_tolerance: 1e-5,
            root_tolerance: 1e-6,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => value.parse::<i64>().ok().map(|number| number != 0),
    }
}

impl Config {
    /// Apply the settings found in `key = value` text on top of the current ones.  Unknown keys,
    /// lines without `=` and unparsable values are ignored.
    pub fn apply_text(&mut self, text: &str) {
        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };

            let value = value.trim();

            match key.trim() {
                "print_precision" => {
                    if let Ok(precision) = value.parse::<usize>() {
                        self.print_precision = precision.min(MAX_PRINT_PRECISION);
                    }
                }

                "fixed_point" => {
                    if let Some(flag) = parse_flag(value) {
                        self.fixed_point = flag;
                    }
                }

                "verbose_mode" => {
                    if let Some(flag) = parse_flag(value) {
                        self.verbose_mode = flag;
                    }
                }

                "selected_function" => {
                    if let Ok(index) = value.parse() {
                        self.selected_function = index;
                    }
                }

                "path_to_data_and_programs" => {
                    if !value.is_empty() {
                        self.path_to_data_and_programs = value.to_string();
                    }
                }

                "recursion_limit" => {
                    if let Ok(limit) = value.parse::<usize>()
                        && limit > 0
                    {
                        self.recursion_limit = limit.min(MAX_RECURSION_LIMIT);
                    }
                }

                "integration_tolerance" => {
                    if let Ok(tolerance) = value.parse()
                        && tolerance_in_range(tolerance)
                    {
                        self.integration_tolerance = tolerance;
                    }
                }

                "root_tolerance" => {
                    if let Ok(tolerance) = value.parse()
                        && tolerance_in_range(tolerance)
                    {
                        self.root_tolerance = tolerance;
                    }
                }

                _ => {}
            }
        }
    }

    /// Render the settings in the `key = value` format.
    pub fn to_text(&self) -> String {
        format!(
            "print_precision = {}\n\
             fixed_point = {}\n\
             verbose_mode = {}\n\
             selected_function = {}\n\
             path_to_data_and_programs = {}\n\
             recursion_limit = {}\n\
             integration_tolerance = {:e}\n\
             root_tolerance = {:e}\n",
            self.print_precision,
            self.fixed_point as u8,
            self.verbose_mode as u8,
            self.selected_function,
            self.path_to_data_and_programs,
            self.recursion_limit,
            self.integration_tolerance,
            self.root_tolerance
        )
    }

    /// Load settings from a file on top of the current ones.
    pub fn load_from_file(&mut self, path: &str) -> error::Result<()> {
        let text = read_to_string(path).map_err(|error| {
            ScriptError::new(
                ErrorKind::Io,
                None,
                format!("Could not read config file {}: {}", path, error),
                None,
            )
        })?;

        self.apply_text(&text);
        Ok(())
    }

    pub fn save_to_file(&self, path: &str) -> error::Result<()> {
        write(path, self.to_text())?;
        Ok(())
    }
}

/// Is the tolerance within the accepted range?
pub fn tolerance_in_range(tolerance: f64) -> bool {
    tolerance >= TOLERANCE_RANGE.0 && tolerance <= TOLERANCE_RANGE.1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_survive_text_round_trip() {
        let mut config = Config::default();

        config.print_precision = 12;
        config.fixed_point = false;
        config.selected_function = 3;
        config.root_tolerance = 1e-8;

        let mut loaded = Config::default();
        loaded.apply_text(&config.to_text());

        assert_eq!(loaded, config);
    }

    #[test]
    fn junk_lines_are_ignored() {
        let mut config = Config::default();
        config.apply_text("no equals here\nunknown = 5\nprint_precision = lots\nverbose_mode=1\n");

        assert_eq!(config.print_precision, 6);
        assert!(config.verbose_mode);
    }

    #[test]
    fn recursion_limit_is_clamped() {
        let mut config = Config::default();

        config.apply_text("recursion_limit = 100000000
");
        assert_eq!(config.recursion_limit, MAX_RECURSION_LIMIT);

        config.apply_text("recursion_limit = 0
");
        assert_eq!(config.recursion_limit, MAX_RECURSION_LIMIT);
    }
}
