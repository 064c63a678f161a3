//! Composite fallbacks - placeholder families assembled from several fields

use crate::similarity::{NormalizedName, PROPERTY_QUALIFIERS};
use doc_model::ExtractedRecord;

/// Words allowed after `MORTGAGE...` for the lender summary
const MORTGAGEE_QUALIFIERS: &[&str] =
    &["info", "information", "details", "name", "lender", "company", "co", "clause"];

fn only_tokens(placeholder: &NormalizedName, core: &[&str], qualifiers: &[&str]) -> bool {
    placeholder
        .tokens()
        .iter()
        .all(|t| core.contains(&t.as_str()) || qualifiers.contains(&t.as_str()))
}

/// A placeholder family that can be assembled from multiple record keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeFamily {
    /// `city, state zip` (e.g. `CITY_STATE_ZIP`, `INSURED_CSZ`)
    CityStateZip,
    /// `street, city, state zip` for the insured property (`RISK_ADDRESS`)
    Address,
    /// `company / Loan # number` (`MORTGAGEE_INFO`, `MORTGAGE_LENDER`)
    Mortgagee,
}

/// A value built by a composite rule, with the keys it read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    pub value: String,
    pub keys: Vec<String>,
}

impl CompositeFamily {
    /// Families in the order they are tried
    pub const ALL: [CompositeFamily; 3] = [Self::CityStateZip, Self::Address, Self::Mortgagee];

    pub fn name(&self) -> &'static str {
        match self {
            Self::CityStateZip => "city_state_zip",
            Self::Address => "address",
            Self::Mortgagee => "mortgagee",
        }
    }

    /// Family of `placeholder`, if any
    pub fn classify(placeholder: &NormalizedName) -> Option<Self> {
        Self::ALL.into_iter().find(|family| family.matches(placeholder))
    }

    fn matches(&self, placeholder: &NormalizedName) -> bool {
        match self {
            Self::CityStateZip => {
                let named = placeholder.has_token("csz")
                    || ["city", "state", "zip"].iter().all(|t| placeholder.has_token(t));
                named && only_tokens(placeholder, &["csz", "city", "state", "zip"], PROPERTY_QUALIFIERS)
            }
            Self::Address => {
                (placeholder.has_token("address") || placeholder.has_token("addr"))
                    && only_tokens(placeholder, &["address", "addr"], PROPERTY_QUALIFIERS)
            }
            Self::Mortgagee => match placeholder.tokens().split_first() {
                Some((first, rest)) => {
                    first.starts_with("mortgage")
                        && rest.iter().all(|t| MORTGAGEE_QUALIFIERS.contains(&t.as_str()))
                }
                None => false,
            },
        }
    }

    /// Assemble the family's value; `None` when too few parts are present to
    /// form a trustworthy value.
    pub fn assemble(&self, record: &ExtractedRecord) -> Option<Assembled> {
        match self {
            Self::CityStateZip => {
                let city = Part::read(record, "address_city")?;
                let tail = state_zip(record);
                if tail.is_empty() {
                    return None;
                }
                Some(join(vec![vec![city], tail], ", "))
            }
            Self::Address => {
                let street = Part::read(record, "address_street")?;
                let mut groups = vec![vec![street]];
                if let Some(city) = Part::read(record, "address_city") {
                    groups.push(vec![city]);
                }
                let tail = state_zip(record);
                if !tail.is_empty() {
                    groups.push(tail);
                }
                // a lone street line is not an address
                (groups.len() > 1).then(|| join(groups, ", "))
            }
            Self::Mortgagee => {
                let company = Part::read(record, "mortgage_company")?;
                let mut assembled = join(vec![vec![company]], "");
                if let Some(loan) = Part::read(record, "loan_number") {
                    assembled.value = format!("{} / Loan # {}", assembled.value, loan.value);
                    assembled.keys.push(loan.key);
                }
                Some(assembled)
            }
        }
    }
}

struct Part {
    key: String,
    value: String,
}

impl Part {
    fn read(record: &ExtractedRecord, key: &str) -> Option<Part> {
        record.get(key).map(|value| Part {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

/// `state zip`, either part optional
fn state_zip(record: &ExtractedRecord) -> Vec<Part> {
    ["address_state", "address_zip"]
        .into_iter()
        .filter_map(|key| Part::read(record, key))
        .collect()
}

/// Parts inside a group are joined with a space, groups with `separator`
fn join(groups: Vec<Vec<Part>>, separator: &str) -> Assembled {
    let mut keys = Vec::new();
    let rendered: Vec<String> = groups
        .into_iter()
        .filter(|group| !group.is_empty())
        .map(|group| {
            let words: Vec<String> = group
                .into_iter()
                .map(|part| {
                    keys.push(part.key);
                    part.value
                })
                .collect();
            words.join(" ")
        })
        .collect();
    Assembled {
        value: rendered.join(separator),
        keys,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> ExtractedRecord {
        ExtractedRecord::from_fields(pairs.iter().map(|(k, v)| (*k, Some(v.to_string()))))
    }

    fn family(placeholder: &str) -> Option<CompositeFamily> {
        CompositeFamily::classify(&NormalizedName::new(placeholder))
    }

    #[test]
    fn test_classify() {
        assert_eq!(family("INSURED_ADDRESS"), Some(CompositeFamily::Address));
        assert_eq!(family("RISK_ADDR"), Some(CompositeFamily::Address));
        assert_eq!(family("CITY_STATE_ZIP"), Some(CompositeFamily::CityStateZip));
        assert_eq!(family("INSURED_CSZ"), Some(CompositeFamily::CityStateZip));
        assert_eq!(family("MORTGAGEE_INFO"), Some(CompositeFamily::Mortgagee));
        assert_eq!(family("ROOF_AGE"), None);
    }

    #[test]
    fn test_other_parties_are_not_composited() {
        assert_eq!(family("MORTGAGEE_ADDRESS"), None);
        assert_eq!(family("AGENT_ADDRESS"), None);
        assert_eq!(family("MORTGAGEE_PHONE"), None);
        assert_eq!(family("ADJUSTER_CITY_STATE_ZIP"), None);
    }

    #[test]
    fn test_full_address() {
        let r = record(&[
            ("address_street", "12 Elm St"),
            ("address_city", "Houston"),
            ("address_state", "TX"),
            ("address_zip", "77002"),
        ]);
        let assembled = CompositeFamily::Address.assemble(&r).unwrap();
        assert_eq!(assembled.value, "12 Elm St, Houston, TX 77002");
        assert_eq!(assembled.keys.len(), 4);
    }

    #[test]
    fn test_address_skips_missing_parts_cleanly() {
        let r = record(&[("address_street", "12 Elm St"), ("address_zip", "77002")]);
        assert_eq!(CompositeFamily::Address.assemble(&r).unwrap().value, "12 Elm St, 77002");

        let r = record(&[("address_street", "12 Elm St"), ("address_city", "Houston")]);
        assert_eq!(CompositeFamily::Address.assemble(&r).unwrap().value, "12 Elm St, Houston");
    }

    #[test]
    fn test_partial_address_is_not_assembled() {
        assert!(CompositeFamily::Address.assemble(&record(&[("address_street", "12 Elm St")])).is_none());
        assert!(CompositeFamily::Address
            .assemble(&record(&[("address_city", "Houston"), ("address_zip", "77002")]))
            .is_none());
    }

    #[test]
    fn test_city_state_zip() {
        let r = record(&[("address_city", "Houston"), ("address_state", "TX")]);
        assert_eq!(CompositeFamily::CityStateZip.assemble(&r).unwrap().value, "Houston, TX");
        assert!(CompositeFamily::CityStateZip
            .assemble(&record(&[("address_city", "Houston")]))
            .is_none());
    }

    #[test]
    fn test_mortgagee() {
        let r = record(&[("mortgage_company", "First Bank"), ("loan_number", "0042")]);
        let assembled = CompositeFamily::Mortgagee.assemble(&r).unwrap();
        assert_eq!(assembled.value, "First Bank / Loan # 0042");
        assert_eq!(assembled.keys, vec!["mortgage_company", "loan_number"]);

        let r = record(&[("mortgage_company", "First Bank")]);
        assert_eq!(CompositeFamily::Mortgagee.assemble(&r).unwrap().value, "First Bank");
    }
}
