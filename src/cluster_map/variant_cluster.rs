use std::collections::BTreeMap;
use std::fmt;

use itertools::Itertools;
use strum::IntoEnumIterator;

use crate::location::Location;
use crate::variant_record::VariantRecord;

/// Reference and alternate allele of a small variant
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct AllelePair {
    pub ref_allele: String,
    pub alt_allele: String,
}

/// An INFO value coerced to an integer where possible
///
/// Integers sort before strings so that mixed value lists still have a total order.
///
#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum InfoValue {
    Int(i64),
    Str(String),
}

impl InfoValue {
    pub fn parse(value: &str) -> Self {
        match value.parse::<i64>() {
            Ok(x) => InfoValue::Int(x),
            Err(_) => InfoValue::Str(value.to_string()),
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, InfoValue::Int(0))
    }
}

impl fmt::Display for InfoValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InfoValue::Int(x) => write!(f, "{x}"),
            InfoValue::Str(x) => write!(f, "{x}"),
        }
    }
}

/// SV INFO fields summarized over all members of a cluster
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, strum::EnumIter, strum::IntoStaticStr,
)]
pub enum SvInfoField {
    #[strum(serialize = "CHR2")]
    Chr2,
    #[strum(serialize = "END")]
    End,
    #[strum(serialize = "SVTYPE")]
    SvType,
    #[strum(serialize = "SVLEN")]
    SvLen,
}

impl SvInfoField {
    pub fn label(&self) -> &'static str {
        self.into()
    }
}

/// Get the lower median of the values
///
/// For an even number of values the lower of the two central values is selected, so that the
/// result is always one of the input values.
///
pub fn get_lower_median<T: Ord + Clone>(values: &[T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    let mut values = values.to_vec();
    values.sort();
    Some(values[(values.len() - 1) / 2].clone())
}

/// Median values of the summarized SV INFO fields
///
/// Fields without any observed value, or with a median value of 0, are absent.
///
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SvInfoMedians {
    data: BTreeMap<SvInfoField, InfoValue>,
}

impl SvInfoMedians {
    pub fn get(&self, field: SvInfoField) -> Option<&InfoValue> {
        self.data.get(&field)
    }
}

/// One caller's record contributing to a cluster
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClusterMember {
    pub caller: String,
    pub record: VariantRecord,
}

/// The shape of a cluster and its anchor locations
///
/// The anchor is the location of the record which created the cluster. All later members are
/// within the matching window of the anchor.
///
#[derive(Clone, Debug)]
pub enum ClusterKind {
    Point {
        location: Location,
        allele: Option<AllelePair>,
    },
    Sv {
        location1: Location,
        location2: Option<Location>,
    },
}

/// Accumulates all records matched to a single consensus call
///
pub struct VariantCluster {
    kind: ClusterKind,
    members: Vec<ClusterMember>,
    positions1: Vec<i64>,
    positions2: Vec<i64>,
    info_values: BTreeMap<SvInfoField, Vec<InfoValue>>,
}

impl VariantCluster {
    fn new(kind: ClusterKind) -> Self {
        Self {
            kind,
            members: Vec::new(),
            positions1: Vec::new(),
            positions2: Vec::new(),
            info_values: BTreeMap::new(),
        }
    }

    pub fn new_point(location: Location, allele: Option<AllelePair>) -> Self {
        Self::new(ClusterKind::Point { location, allele })
    }

    pub fn new_sv(location1: Location, location2: Option<Location>) -> Self {
        Self::new(ClusterKind::Sv {
            location1,
            location2,
        })
    }

    pub fn is_sv(&self) -> bool {
        matches!(self.kind, ClusterKind::Sv { .. })
    }

    pub fn chrom(&self) -> &str {
        match &self.kind {
            ClusterKind::Point { location, .. } => location.chrom(),
            ClusterKind::Sv { location1, .. } => location1.chrom(),
        }
    }

    /// Position of the second anchor location, if any
    pub fn anchor_pos2(&self) -> Option<i64> {
        match &self.kind {
            ClusterKind::Point { .. } => None,
            ClusterKind::Sv { location2, .. } => location2.as_ref().map(|x| x.pos()),
        }
    }

    pub fn add_point_member(&mut self, caller: &str, record: VariantRecord) {
        assert!(!self.is_sv());
        self.positions1.push(record.pos);
        self.members.push(ClusterMember {
            caller: caller.to_string(),
            record,
        });
    }

    /// Add an SV record with its derived breakpoint locations
    ///
    /// INFO values are extracted on a best-effort basis, fields which are missing from the
    /// record are skipped.
    ///
    pub fn add_sv_member(
        &mut self,
        caller: &str,
        record: VariantRecord,
        loc1: &Location,
        loc2: Option<&Location>,
    ) {
        let ClusterKind::Sv {
            location1,
            location2,
        } = &self.kind
        else {
            panic!("Attempting to add SV record to SNV/indel cluster");
        };
        assert!(location1.is_compatible(loc1));
        match (location2, loc2) {
            (Some(a), Some(b)) => assert!(a.is_compatible(b)),
            (None, None) => {}
            _ => panic!("Attempting to add SV record with inconsistent mate to cluster"),
        }

        self.positions1.push(loc1.pos());
        if let Some(loc2) = loc2 {
            self.positions2.push(loc2.pos());
        }
        for field in SvInfoField::iter() {
            if let Some(value) = record.info_value(field.label())
                && !value.is_empty()
            {
                self.info_values
                    .entry(field)
                    .or_default()
                    .push(InfoValue::parse(value));
            }
        }
        self.members.push(ClusterMember {
            caller: caller.to_string(),
            record,
        });
    }

    /// Representative position of the first (or only) breakpoint side
    pub fn median_pos1(&self) -> i64 {
        get_lower_median(&self.positions1).unwrap()
    }

    pub fn median_pos2(&self) -> Option<i64> {
        get_lower_median(&self.positions2)
    }

    pub fn get_info_medians(&self) -> SvInfoMedians {
        let data = self
            .info_values
            .iter()
            .filter_map(|(&field, values)| {
                let median = get_lower_median(values)?;
                if median.is_zero() {
                    None
                } else {
                    Some((field, median))
                }
            })
            .collect();
        SvInfoMedians { data }
    }

    /// Convert to the read-only output form
    ///
    /// Panics if the cluster has no members, which can't occur for a cluster created by
    /// ClusterMap.
    ///
    pub fn finalize(self) -> FinalizedCluster {
        assert!(!self.members.is_empty());
        let median_pos1 = self.median_pos1();
        let median_pos2 = self.median_pos2();
        let info_medians = self.get_info_medians();
        let callers = self.members.iter().map(|x| x.caller.clone()).collect();
        match self.kind {
            ClusterKind::Point { location, allele } => {
                FinalizedCluster::Point(PointConsensusCluster {
                    location,
                    allele,
                    callers,
                    median_pos: median_pos1,
                })
            }
            ClusterKind::Sv {
                location1,
                location2,
            } => FinalizedCluster::Sv(SvConsensusCluster {
                location1,
                location2,
                callers,
                median_pos1,
                median_pos2,
                members: self.members,
                info_medians,
            }),
        }
    }
}

/// Get the distinct callers from a caller list, in the order each was first observed
pub fn get_distinct_callers(callers: &[String]) -> Vec<String> {
    callers.iter().unique().cloned().collect()
}

/// Finalized SNV/indel cluster
#[derive(Clone, Debug)]
pub struct PointConsensusCluster {
    /// Anchor location of the cluster
    pub location: Location,

    pub allele: Option<AllelePair>,

    /// Caller of each cluster member, in member order
    pub callers: Vec<String>,

    pub median_pos: i64,
}

/// Finalized SV cluster
#[derive(Clone, Debug)]
pub struct SvConsensusCluster {
    /// Anchor locations of the cluster
    pub location1: Location,
    pub location2: Option<Location>,

    /// Caller of each cluster member, in member order
    pub callers: Vec<String>,

    pub median_pos1: i64,
    pub median_pos2: Option<i64>,

    pub members: Vec<ClusterMember>,

    pub info_medians: SvInfoMedians,
}

#[derive(Clone, Debug)]
pub enum FinalizedCluster {
    Point(PointConsensusCluster),
    Sv(SvConsensusCluster),
}

#[cfg(test)]
impl FinalizedCluster {
    pub fn callers(&self) -> &[String] {
        match self {
            FinalizedCluster::Point(x) => &x.callers,
            FinalizedCluster::Sv(x) => &x.callers,
        }
    }
}
