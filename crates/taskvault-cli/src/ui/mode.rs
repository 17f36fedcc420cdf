//! Output mode routing.

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One JSON document per command
    Json,
    /// Stable `key=value` lines for scripts
    #[default]
    Plain,
    /// Tables and colors on a terminal
    Pretty,
}

impl OutputMode {
    /// `--json` wins; `TERM=dumb` and pipes get plain text.
    pub fn resolve(json_flag: bool, is_tty: bool, term_is_dumb: bool) -> Self {
        if json_flag {
            Self::Json
        } else if is_tty && !term_is_dumb {
            Self::Pretty
        } else {
            Self::Plain
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }

    pub fn is_pretty(&self) -> bool {
        matches!(self, Self::Pretty)
    }
}
