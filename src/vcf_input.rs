//! Read caller VCF/BCF files into VariantRecords
//!

use camino::Utf8Path;
use log::debug;
use rust_htslib::bcf::header::{HeaderRecord, HeaderView, TagType};
use rust_htslib::bcf::{self, Read};
use simple_error::{SimpleResult, bail, try_with};

use crate::variant_record::VariantRecord;

// Imported non-public constants from rust-htslib
const MISSING_INTEGER: i32 = i32::MIN;
const VECTOR_END_INTEGER: i32 = i32::MIN + 1;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContigInfo {
    pub name: String,
    pub length: Option<u64>,
}

/// Full contents of one caller's variant file
pub struct VariantFileData {
    /// Contigs declared in the file header, in header order
    pub contigs: Vec<ContigInfo>,

    pub records: Vec<VariantRecord>,
}

fn to_string_lossy(x: &[u8]) -> String {
    String::from_utf8_lossy(x).to_string()
}

/// Get the ID and type of every INFO field declared in the header
fn get_info_fields(header: &HeaderView) -> Vec<(String, TagType)> {
    header
        .header_records()
        .into_iter()
        .filter_map(|x| match x {
            HeaderRecord::Info { values, .. } => values.get("ID").cloned(),
            _ => None,
        })
        .filter_map(|id| {
            let (tag_type, _) = header.info_type(id.as_bytes()).ok()?;
            Some((id, tag_type))
        })
        .collect()
}

fn get_contigs(header: &HeaderView) -> Vec<ContigInfo> {
    header
        .header_records()
        .into_iter()
        .filter_map(|x| match x {
            HeaderRecord::Contig { values, .. } => {
                let name = values.get("ID")?.clone();
                let length = values.get("length").and_then(|x| x.parse::<u64>().ok());
                Some(ContigInfo { name, length })
            }
            _ => None,
        })
        .collect()
}

/// Get all values of one INFO field in string form
///
/// Returns None if the field is absent from the record or can't be parsed. Missing values are
/// removed. Flags which are set are returned as an empty value list.
///
fn get_info_values(rec: &bcf::Record, key: &str, tag_type: TagType) -> Option<Vec<String>> {
    let key = key.as_bytes();
    let values = match tag_type {
        TagType::Flag => {
            let is_set = rec.info(key).flag().ok()?;
            return is_set.then(Vec::new);
        }
        TagType::Integer => rec
            .info(key)
            .integer()
            .ok()??
            .iter()
            .filter(|&&x| x != MISSING_INTEGER && x != VECTOR_END_INTEGER)
            .map(|x| x.to_string())
            .collect::<Vec<_>>(),
        TagType::Float => rec
            .info(key)
            .float()
            .ok()??
            .iter()
            .filter(|x| !x.is_nan())
            .map(|x| x.to_string())
            .collect::<Vec<_>>(),
        TagType::String => rec
            .info(key)
            .string()
            .ok()??
            .iter()
            .flat_map(|x| {
                to_string_lossy(x)
                    .split(',')
                    .map(|x| x.to_string())
                    .collect::<Vec<_>>()
            })
            .filter(|x| !x.is_empty() && x != ".")
            .collect::<Vec<_>>(),
    };

    if values.is_empty() { None } else { Some(values) }
}

/// Convert an htslib record into a VariantRecord
///
/// INFO fields which are not declared in the header are not converted.
///
fn convert_bcf_record(
    rec: &bcf::Record,
    info_fields: &[(String, TagType)],
) -> SimpleResult<VariantRecord> {
    let header = rec.header();
    let Some(rid) = rec.rid() else {
        bail!("Variant record has no chromosome");
    };
    let chrom = try_with!(header.rid2name(rid), "Unknown chromosome id {}", rid);

    let alleles = rec.alleles();
    let ref_allele = alleles
        .first()
        .map(|x| to_string_lossy(x))
        .unwrap_or_default();
    let alt_alleles = alleles
        .iter()
        .skip(1)
        .map(|x| to_string_lossy(x))
        .filter(|x| x != ".")
        .collect();

    let filters = rec
        .filters()
        .map(|id| to_string_lossy(&header.id_to_name(id)))
        .collect();

    let info = info_fields
        .iter()
        .filter_map(|(key, tag_type)| {
            get_info_values(rec, key, *tag_type).map(|values| (key.clone(), values))
        })
        .collect();

    Ok(VariantRecord {
        chrom: to_string_lossy(chrom),
        pos: rec.pos(),
        ref_allele,
        alt_alleles,
        filters,
        info,
    })
}

/// Read all records from a VCF or BCF file
///
/// The whole file is read before returning, so that a file which fails part way through can be
/// excluded entirely by the caller.
///
pub fn read_variant_file(filename: &Utf8Path) -> SimpleResult<VariantFileData> {
    let mut reader = try_with!(
        bcf::Reader::from_path(filename),
        "Unable to open variant file '{}'",
        filename
    );
    let info_fields = get_info_fields(reader.header());

    let mut records = Vec::new();
    let mut rec = reader.empty_record();
    while let Some(r) = reader.read(&mut rec) {
        try_with!(
            r,
            "Failed to parse variant record {} from file '{}'",
            records.len() + 1,
            filename
        );
        let record = try_with!(
            convert_bcf_record(&rec, &info_fields),
            "Failed to convert variant record {} from file '{}'",
            records.len() + 1,
            filename
        );
        records.push(record);
    }

    // Contigs are read last to pick up any which were added while parsing records
    let contigs = get_contigs(reader.header());

    debug!(
        "Read {} records and {} contigs from variant file '{filename}'",
        records.len(),
        contigs.len()
    );

    Ok(VariantFileData { contigs, records })
}


#[cfg(test)]
mod tests {
    use super::test_utils::make_temp_vcf;
    use super::*;

    const TEST_VCF: &str = "\
##fileformat=VCFv4.2
##FILTER=<ID=LowQual,Description=\"Low quality\">
##contig=<ID=chr1,length=248956422>
##contig=<ID=chr2>
##INFO=<ID=SVTYPE,Number=1,Type=String,Description=\"\">
##INFO=<ID=SVLEN,Number=.,Type=Integer,Description=\"\">
##INFO=<ID=END,Number=1,Type=Integer,Description=\"\">
##INFO=<ID=IMPRECISE,Number=0,Type=Flag,Description=\"\">
##INFO=<ID=AF,Number=A,Type=Float,Description=\"\">
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO
chr1\t1001\tdel1\tN\t<DEL>\t.\tPASS\tSVTYPE=DEL;SVLEN=-1000;END=2000;IMPRECISE
chr1\t3001\tsnv1\tA\tT,G\t50\tLowQual\tAF=0.25,0.5
chr2\t10\t.\tC\t.\t.\t.\tSVLEN=.
";

    #[test]
    fn test_read_variant_file() {
        let file = make_temp_vcf(TEST_VCF);
        let path = Utf8Path::from_path(file.path()).unwrap();
        let data = read_variant_file(path).unwrap();

        assert_eq!(
            data.contigs,
            vec![
                ContigInfo {
                    name: "chr1".to_string(),
                    length: Some(248956422),
                },
                ContigInfo {
                    name: "chr2".to_string(),
                    length: None,
                },
            ]
        );
        assert_eq!(data.records.len(), 3);

        let del = &data.records[0];
        assert_eq!(del.chrom, "chr1");
        assert_eq!(del.pos, 1000);
        assert_eq!(del.ref_allele, "N");
        assert_eq!(del.alt_alleles, vec!["<DEL>"]);
        assert_eq!(del.filters, vec!["PASS"]);
        assert!(del.is_pass());
        assert_eq!(del.info_value("SVTYPE"), Some("DEL"));
        assert_eq!(del.info_value("SVLEN"), Some("-1000"));
        assert_eq!(del.info_value("END"), Some("2000"));
        assert!(del.has_info("IMPRECISE"));
        assert!(!del.has_info("AF"));

        let snv = &data.records[1];
        assert_eq!(snv.alt_alleles, vec!["T", "G"]);
        assert_eq!(snv.filters, vec!["LowQual"]);
        assert!(!snv.is_pass());
        assert_eq!(snv.info.get("AF").unwrap(), &vec!["0.25", "0.5"]);
        assert!(!snv.has_info("IMPRECISE"));

        let no_alt = &data.records[2];
        assert_eq!(no_alt.chrom, "chr2");
        assert_eq!(no_alt.pos, 9);
        assert!(no_alt.alt_alleles.is_empty());
        assert!(no_alt.filters.is_empty());
        assert!(no_alt.is_pass());
        assert!(!no_alt.has_info("SVLEN"));
    }

    #[test]
    fn test_missing_file() {
        let result = read_variant_file(Utf8Path::new("/nonexistent/calls.vcf"));
        assert!(result.is_err());
    }
}
