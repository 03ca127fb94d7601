use std::collections::BTreeMap;
use std::fmt;

use itertools::Itertools;

pub const PASS_FILTER_ID: &str = "PASS";

/// A read-only variant call as reported by one caller
///
/// All INFO values are kept in their textual form. Flag fields are stored with an empty value
/// list. Missing values ('.') are dropped on input.
///
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VariantRecord {
    pub chrom: String,

    /// 0-indexed position of the record
    pub pos: i64,

    pub ref_allele: String,
    pub alt_alleles: Vec<String>,

    /// FILTER column values. An empty list corresponds to a '.' FILTER column
    pub filters: Vec<String>,

    pub info: BTreeMap<String, Vec<String>>,
}

impl VariantRecord {
    /// Get the first value of an INFO field
    pub fn info_value(&self, key: &str) -> Option<&str> {
        self.info
            .get(key)
            .and_then(|x| x.first())
            .map(|x| x.as_str())
    }

    pub fn has_info(&self, key: &str) -> bool {
        self.info.contains_key(key)
    }

    /// True if the record has a PASS filter or no filter at all
    pub fn is_pass(&self) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|x| x == PASS_FILTER_ID)
    }

    /// True if the record should be interpreted as a structural variant
    ///
    /// Any record with an SVTYPE, a symbolic ALT allele or a breakend ALT allele qualifies.
    ///
    pub fn is_sv(&self) -> bool {
        self.has_info("SVTYPE")
            || self
                .alt_alleles
                .iter()
                .any(|x| is_symbolic_allele(x) || is_breakend_allele(x))
    }
}

pub fn is_symbolic_allele(allele: &str) -> bool {
    allele.starts_with('<') && allele.ends_with('>')
}

pub fn is_breakend_allele(allele: &str) -> bool {
    allele.contains('[') || allele.contains(']')
}

/// Render the record in an approximate VCF line format for debug output
impl fmt::Display for VariantRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let alts = if self.alt_alleles.is_empty() {
            ".".to_string()
        } else {
            self.alt_alleles.join(",")
        };
        let filters = if self.filters.is_empty() {
            ".".to_string()
        } else {
            self.filters.join(";")
        };
        let info = if self.info.is_empty() {
            ".".to_string()
        } else {
            self.info
                .iter()
                .map(|(key, values)| {
                    if values.is_empty() {
                        key.clone()
                    } else {
                        format!("{key}={}", values.join(","))
                    }
                })
                .join(";")
        };
        write!(
            f,
            "{}\t{}\t.\t{}\t{alts}\t.\t{filters}\t{info}",
            self.chrom,
            self.pos + 1,
            self.ref_allele,
        )
    }
}
