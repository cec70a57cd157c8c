use serde::Deserialize;
use zhconv::{zhconv, Variant};

/// Converts Simplified-script text into a Traditional form.
///
/// Implementations must be deterministic and leave characters without a
/// Simplified/Traditional distinction untouched.
pub trait ScriptNormalizer: Send + Sync {
    fn normalize(&self, text: &str) -> String;
}

/// Target character set for [`ZhconvNormalizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptVariant {
    #[default]
    Traditional,
    HongKong,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ZhconvNormalizer {
    variant: ScriptVariant,
}

impl ZhconvNormalizer {
    pub fn new(variant: ScriptVariant) -> Self {
        ZhconvNormalizer { variant }
    }
}

impl ScriptNormalizer for ZhconvNormalizer {
    fn normalize(&self, text: &str) -> String {
        let target = match self.variant {
            ScriptVariant::Traditional => Variant::ZhHant,
            ScriptVariant::HongKong => Variant::ZhHK,
        };
        zhconv(text, target)
    }
}

/// Leaves text as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl ScriptNormalizer for Identity {
    fn normalize(&self, text: &str) -> String {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simplified_becomes_traditional() {
        let n = ZhconvNormalizer::new(ScriptVariant::Traditional);
        assert_eq!(n.normalize("现在"), "現在");
    }

    #[test]
    fn text_without_script_distinction_is_kept() {
        let n = ZhconvNormalizer::default();
        assert_eq!(n.normalize("abc 123"), "abc 123");
        assert_eq!(n.normalize(""), "");
    }

    #[test]
    fn identity_is_identity() {
        assert_eq!(Identity.normalize("现在"), "现在");
    }
}
