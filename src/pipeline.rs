use crate::normalize::ScriptNormalizer;
use crate::remap::{apply_table, strip_markers, MappingTable, Mode};

/// Which passes run, and in which mode the translation table is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pipeline {
    pub mode: Mode,
    pub normalize_script: bool,
    pub standardize_symbols: bool,
}

impl Pipeline {
    /// Script normalization, then symbol standardization, then translation.
    ///
    /// Markers survive between the two tables so that translation rules never
    /// re-match standardized symbols; they are stripped once at the end.
    /// `symbols` is ignored unless `standardize_symbols` is set.
    pub fn run(
        &self,
        text: &str,
        normalizer: &dyn ScriptNormalizer,
        symbols: Option<&MappingTable>,
        translations: &MappingTable,
    ) -> String {
        let mut current = strip_markers(text);
        if self.normalize_script {
            current = normalizer.normalize(&current);
        }
        if self.standardize_symbols {
            if let Some(symbols) = symbols {
                current = apply_table(&current, symbols, Mode::Replacement);
            }
        }
        current = apply_table(&current, translations, self.mode);
        strip_markers(&current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Identity;
    use crate::remap::{MappingRule, MARKER};

    struct Upper;

    impl ScriptNormalizer for Upper {
        fn normalize(&self, text: &str) -> String {
            text.to_uppercase()
        }
    }

    fn table(name: &str, rules: &[(&str, &str)]) -> MappingTable {
        MappingTable::new(
            name,
            rules
                .iter()
                .map(|(l, r)| MappingRule::new(*l, *r).unwrap())
                .collect(),
        )
    }

    fn pipeline(mode: Mode, normalize_script: bool, standardize_symbols: bool) -> Pipeline {
        Pipeline {
            mode,
            normalize_script,
            standardize_symbols,
        }
    }

    #[test]
    fn symbols_run_before_translation() {
        let symbols = table("FirstPassConfig", &[(",", "，")]);
        let translations = table("Mappings", &[("好，", "OK")]);
        let out = pipeline(Mode::Replacement, false, true).run(
            "好,",
            &Identity,
            Some(&symbols),
            &translations,
        );
        // the standardized comma is earlier output, so the lookup cannot use it
        assert_eq!(out, "好，");
    }

    #[test]
    fn symbols_skipped_when_disabled() {
        let symbols = table("FirstPassConfig", &[(",", "，")]);
        let translations = table("Mappings", &[("現在", "依家")]);
        let out = pipeline(Mode::Replacement, false, false).run(
            "現在,",
            &Identity,
            Some(&symbols),
            &translations,
        );
        assert_eq!(out, "依家,");
    }

    #[test]
    fn normalizer_runs_first() {
        let translations = table("Mappings", &[("AB", "x")]);
        let out = pipeline(Mode::Replacement, true, false).run("ab", &Upper, None, &translations);
        assert_eq!(out, "x");
    }

    #[test]
    fn normalizer_skipped_when_disabled() {
        let translations = table("Mappings", &[("AB", "x")]);
        let out = pipeline(Mode::Replacement, false, false).run("ab", &Upper, None, &translations);
        assert_eq!(out, "ab");
    }

    #[test]
    fn symbols_always_replace_even_in_highlight_mode() {
        let symbols = table("FirstPassConfig", &[("!", "！")]);
        let translations = table("Mappings", &[("你好", "")]);
        let out = pipeline(Mode::Highlight, false, true).run(
            "你好!",
            &Identity,
            Some(&symbols),
            &translations,
        );
        assert_eq!(out, "【你好】！");
        assert!(!out.contains(MARKER));
    }

    #[test]
    fn empty_input_stays_empty() {
        let translations = table("Mappings", &[("現在", "依家")]);
        let out = pipeline(Mode::Replacement, true, true).run("", &Identity, None, &translations);
        assert_eq!(out, "");
    }
}
