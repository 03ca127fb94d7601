//! Chromosome name ordering and classification
//!

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

/// Default pattern for contigs which are not considered mapped to a chromosome, such as unplaced
/// scaffolds (GL*), decoys (hs*), mitochondria (MT*, M*) and NCBI accessions (NC*)
///
pub const DEFAULT_UNPLACED_CHROM_REGEX: &str = r"^(GL|MT|hs|NC|M)";

static KARYOTYPE_CHROM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:chr)?(\d+|X|Y|MT|M)$").unwrap());

/// Sort class of a chromosome name in standard karyotype order
///
/// Numbered autosomes sort numerically, followed by the sex chromosomes, the mitochondrial
/// chromosome, and finally all other contigs in lexical order.
///
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum ContigOrder {
    Autosome(u64),
    X,
    Y,
    Mito,
    Other(String),
}

impl ContigOrder {
    pub fn from_name(chrom: &str) -> Self {
        let Some(caps) = KARYOTYPE_CHROM_REGEX.captures(chrom) else {
            return ContigOrder::Other(chrom.to_string());
        };
        let label = &caps[1];
        match label {
            "X" => ContigOrder::X,
            "Y" => ContigOrder::Y,
            "M" | "MT" => ContigOrder::Mito,
            _ => match label.parse::<u64>() {
                Ok(x) => ContigOrder::Autosome(x),
                Err(_) => ContigOrder::Other(chrom.to_string()),
            },
        }
    }
}

/// Compare chromosome names in karyotype order
///
/// Names with the same karyotype class (such as "1" and "chr1") are ordered lexically so that the
/// comparison is total.
///
pub fn compare_contigs(a: &str, b: &str) -> Ordering {
    ContigOrder::from_name(a)
        .cmp(&ContigOrder::from_name(b))
        .then_with(|| a.cmp(b))
}

/// Returns true if the contig is mapped to a chromosome, eg. chr1 or X
///
/// Returns false if the contig name matches the unplaced contig pattern
///
pub fn mapped_to_chromosome(chrom: &str, unplaced_chrom_regex: &Regex) -> bool {
    !unplaced_chrom_regex.is_match(chrom)
}
