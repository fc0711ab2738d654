//! Legacy free-text metadata rules.
//!
//! Older exports carry parcel details only inside the HTML `description` of a
//! placemark, as table rows of the form
//! `<td>Label:</td><td>value</td>`. Each rule below names the record field it
//! fills and how to find the value. Rules are tried in order and only fill
//! fields that are still absent.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// How a rule finds its value in the description text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// Literal row label; the value is the next table cell after it.
    Row(&'static str),
    /// Raw pattern whose first capture group is the value.
    Pattern(&'static str),
}

/// One entry of the legacy extraction table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyRule {
    /// Field filled by this rule; the rule is skipped when it is populated.
    pub field: &'static str,
    /// Secondary field filled with the same value when absent.
    pub also: Option<&'static str>,
    pub matcher: Matcher,
}

impl LegacyRule {
    const fn row(field: &'static str, label: &'static str) -> Self {
        Self {
            field,
            also: None,
            matcher: Matcher::Row(label),
        }
    }
}

/// Ordered legacy extraction table.
pub const LEGACY_RULES: &[LegacyRule] = &[
    LegacyRule::row("owner_name", "Malik (TR):"),
    LegacyRule::row("owner_name_ar", "Malik (AR):"),
    LegacyRule {
        field: "area",
        also: Some("area_text"),
        matcher: Matcher::Row("Yüzölçümü:"),
    },
    LegacyRule {
        field: "price",
        also: None,
        matcher: Matcher::Pattern(r"\$([\d,]+)"),
    },
    LegacyRule::row("daily_register_no", "Yevmiye No:"),
    LegacyRule::row("registration_date", "Tescil Tarihi:"),
    LegacyRule::row("share_text", "Hisse:"),
    LegacyRule::row("property_type", "Nitelik:"),
    LegacyRule::row("province", "İl:"),
    LegacyRule::row("district", "Mahalle:"),
    LegacyRule::row("street", "Sokak:"),
    LegacyRule::row("full_address", "Tam Adres:"),
    LegacyRule::row("transaction_type", "İşlem Türü:"),
];

/// Rules with their compiled expressions.
#[allow(clippy::expect_used)] // Patterns are static and covered by tests
static COMPILED_RULES: LazyLock<Vec<(LegacyRule, Regex)>> = LazyLock::new(|| {
    LEGACY_RULES
        .iter()
        .map(|rule| {
            let pattern = match rule.matcher {
                Matcher::Row(label) => {
                    format!(r"(?s){}.*?<td[^>]*>([^<]+)</td>", regex::escape(label))
                }
                Matcher::Pattern(pattern) => pattern.to_string(),
            };
            (*rule, Regex::new(&pattern).expect("valid legacy rule pattern"))
        })
        .collect()
});

/// Fill absent fields from the description text.
///
/// A field counts as absent when it is missing or empty. Populated fields are
/// never overwritten.
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
/// use cadastre_ingest::metadata::fill_from_description;
///
/// let html = "<tr><td>Malik (TR):</td><td>Omar Al-Halabi</td></tr>";
/// let mut fields = BTreeMap::new();
/// fill_from_description(html, &mut fields);
/// assert_eq!(fields["owner_name"], "Omar Al-Halabi");
/// ```
pub fn fill_from_description(description: &str, fields: &mut BTreeMap<String, String>) {
    for (rule, regex) in COMPILED_RULES.iter() {
        if is_populated(fields, rule.field) {
            continue;
        }
        let Some(value) = regex
            .captures(description)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|v| !v.is_empty())
        else {
            continue;
        };

        tracing::trace!(field = rule.field, value, "Legacy description match");
        fields.insert(rule.field.to_string(), value.to_string());
        if let Some(also) = rule.also {
            if !is_populated(fields, also) {
                fields.insert(also.to_string(), value.to_string());
            }
        }
    }
}

fn is_populated(fields: &BTreeMap<String, String>, key: &str) -> bool {
    fields.get(key).is_some_and(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_DESCRIPTION: &str = r#"
<table>
<tr><td style="color: #64748b;">Malik (TR):</td><td style="font-weight: bold;">Muhammad bin Ali Al-Halabi</td></tr>
<tr><td>Malik (AR):</td><td style="direction: rtl;">محمد بن علي الحلبي</td></tr>
<tr><td>Hisse:</td><td>Tamamı (1/1)</td></tr>
<tr><td>Nitelik:</td><td>Konut / سكني</td></tr>
<tr><td>Yüzölçümü:</td><td>245.5 m²</td></tr>
<tr><td>Rayiç Bedel:</td><td>$350,000</td></tr>
<tr><td>İl:</td><td>Halep (حلب)</td></tr>
<tr><td><b>Mahalle:</b></td><td>Al-Farafira</td></tr>
<tr><td>Sokak:</td><td>شارع الفرافرة</td></tr>
<tr><td>Tescil Tarihi:</td><td>12/04/2003</td></tr>
<tr><td>Yevmiye No:</td><td style="font-family: monospace;">2011/4521</td></tr>
<tr><td>İşlem Türü:</td><td>Satış / بيع</td></tr>
</table>"#;

    #[test]
    fn test_all_rules_compile() {
        assert_eq!(COMPILED_RULES.len(), LEGACY_RULES.len());
    }

    #[test]
    fn test_fill_from_legacy_table() {
        let mut fields = BTreeMap::new();
        fill_from_description(LEGACY_DESCRIPTION, &mut fields);

        assert_eq!(fields["owner_name"], "Muhammad bin Ali Al-Halabi");
        assert_eq!(fields["owner_name_ar"], "محمد بن علي الحلبي");
        assert_eq!(fields["area"], "245.5 m²");
        assert_eq!(fields["area_text"], "245.5 m²");
        assert_eq!(fields["price"], "350,000");
        assert_eq!(fields["daily_register_no"], "2011/4521");
        assert_eq!(fields["registration_date"], "12/04/2003");
        assert_eq!(fields["share_text"], "Tamamı (1/1)");
        assert_eq!(fields["property_type"], "Konut / سكني");
        assert_eq!(fields["province"], "Halep (حلب)");
        assert_eq!(fields["district"], "Al-Farafira");
        assert_eq!(fields["street"], "شارع الفرافرة");
        assert_eq!(fields["transaction_type"], "Satış / بيع");
        assert!(!fields.contains_key("full_address"));
    }

    #[test]
    fn test_populated_fields_not_overwritten() {
        let mut fields = BTreeMap::new();
        fields.insert("owner_name".to_string(), "A".to_string());
        fields.insert("area".to_string(), "100".to_string());

        fill_from_description(LEGACY_DESCRIPTION, &mut fields);

        assert_eq!(fields["owner_name"], "A");
        assert_eq!(fields["area"], "100");
        assert!(!fields.contains_key("area_text"));
    }

    #[test]
    fn test_empty_field_counts_as_absent() {
        let mut fields = BTreeMap::new();
        fields.insert("owner_name".to_string(), "  ".to_string());
        fill_from_description(LEGACY_DESCRIPTION, &mut fields);
        assert_eq!(fields["owner_name"], "Muhammad bin Ali Al-Halabi");
    }

    #[test]
    fn test_existing_area_text_kept() {
        let mut fields = BTreeMap::new();
        fields.insert("area_text".to_string(), "245,5 metrekare".to_string());
        fill_from_description(LEGACY_DESCRIPTION, &mut fields);
        assert_eq!(fields["area"], "245.5 m²");
        assert_eq!(fields["area_text"], "245,5 metrekare");
    }

    #[test]
    fn test_no_matches() {
        let mut fields = BTreeMap::new();
        fill_from_description("<p>Parsel bilgisi yok</p>", &mut fields);
        assert!(fields.is_empty());
    }
}
