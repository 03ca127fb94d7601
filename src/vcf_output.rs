//! Write consensus records to the merged VCF output
//!

use camino::Utf8Path;
use itertools::Itertools;
use log::info;
use rust_htslib::bcf;
use simple_error::{SimpleResult, try_with};

use crate::consensus::{ConsensusFilter, ConsensusRecord, LOW_SUPPORT_FILTER_ID};
use crate::contig_order::compare_contigs;
use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::vcf_input::ContigInfo;

pub const CALLERS_INFO_KEY: &str = "Callers";
pub const NUM_CALLERS_INFO_KEY: &str = "NumCallers";

/// Filename used to select stdout for VCF output
pub const STDOUT_FILENAME: &str = "-";

/// Input file description for the output header
pub struct CallerFileInfo {
    pub caller: String,
    pub filename: String,
}

pub struct MergedVcfHeaderInfo {
    pub contigs: Vec<ContigInfo>,
    pub inputs: Vec<CallerFileInfo>,
    pub add_low_support_filter: bool,
    pub output_caller_count: bool,
}

fn get_merged_vcf_header(header_info: &MergedVcfHeaderInfo) -> bcf::Header {
    // The new header already includes the fileformat and PASS filter lines
    let mut header = bcf::Header::new();

    let date_string = chrono::Local::now().format("%Y%m%d").to_string();
    header.push_record(format!("##fileDate={date_string}").as_bytes());
    header.push_record(format!("##source=\"{PROGRAM_NAME} {PROGRAM_VERSION}\"").as_bytes());
    let cmdline = std::env::args().collect::<Vec<_>>().join(" ");
    header.push_record(format!("##{PROGRAM_NAME}_cmdline=\"{cmdline}\"").as_bytes());

    // Add contig records
    let contigs = header_info
        .contigs
        .iter()
        .sorted_by(|a, b| compare_contigs(&a.name, &b.name));
    for contig in contigs {
        let header_contig_line = match contig.length {
            Some(length) => format!("##contig=<ID={},length={length}>", contig.name),
            None => format!("##contig=<ID={}>", contig.name),
        };
        header.push_record(header_contig_line.as_bytes());
    }

    // A caller may be split over several input files
    let caller_files = header_info
        .inputs
        .iter()
        .into_group_map_by(|x| x.caller.as_str());
    for caller in header_info.inputs.iter().map(|x| x.caller.as_str()).unique() {
        let filenames = caller_files[caller].iter().map(|x| &x.filename).join(",");
        let caller_line = format!("##caller=<ID={caller},File=\"{filenames}\">");
        header.push_record(caller_line.as_bytes());
    }

    if header_info.add_low_support_filter {
        let filter_line = format!(
            "##FILTER=<ID={LOW_SUPPORT_FILTER_ID},Description=\"Not called by enough callers in ensemble\">"
        );
        header.push_record(filter_line.as_bytes());
    }

    let callers_line = format!(
        "##INFO=<ID={CALLERS_INFO_KEY},Number=.,Type=String,Description=\"Callers that made this call\">"
    );
    header.push_record(callers_line.as_bytes());

    if header_info.output_caller_count {
        let num_callers_line = format!(
            "##INFO=<ID={NUM_CALLERS_INFO_KEY},Number=1,Type=Integer,Description=\"Number of callers that made this call\">"
        );
        header.push_record(num_callers_line.as_bytes());
    }

    header.push_record(
        br#"##INFO=<ID=SVTYPE,Number=1,Type=String,Description="Type of structural variant">"#,
    );
    header.push_record(
        br#"##INFO=<ID=SVLEN,Number=1,Type=String,Description="Length of structural variant">"#,
    );

    header
}

fn convert_consensus_record_to_vcf_record(
    consensus_record: &ConsensusRecord,
    vcf: &bcf::Writer,
) -> SimpleResult<bcf::Record> {
    let x = consensus_record;
    let mut record = vcf.empty_record();

    let rid = try_with!(
        vcf.header().name2rid(x.chrom.as_bytes()),
        "Output chromosome '{}' is missing from the VCF header",
        x.chrom
    );
    record.set_rid(Some(rid));
    record.set_pos(x.pos);
    try_with!(
        record.set_alleles(&[x.ref_allele.as_bytes(), x.alt_allele.as_bytes()]),
        "Unable to set alleles for output record at {}:{}",
        x.chrom,
        x.pos + 1
    );

    // A passing record is written with an empty ('.') FILTER value
    if x.filter == ConsensusFilter::LowSupport {
        try_with!(
            record.push_filter(LOW_SUPPORT_FILTER_ID.as_bytes()),
            "Unable to set filter for output record"
        );
    }

    let callers = x.callers.join(",");
    try_with!(
        record.push_info_string(CALLERS_INFO_KEY.as_bytes(), &[callers.as_bytes()]),
        "Unable to set {} for output record",
        CALLERS_INFO_KEY
    );
    if let Some(caller_count) = x.caller_count {
        try_with!(
            record.push_info_integer(NUM_CALLERS_INFO_KEY.as_bytes(), &[caller_count as i32]),
            "Unable to set {} for output record",
            NUM_CALLERS_INFO_KEY
        );
    }
    if let Some(svtype) = &x.svtype {
        try_with!(
            record.push_info_string(b"SVTYPE", &[svtype.as_bytes()]),
            "Unable to set SVTYPE for output record"
        );
    }
    if let Some(svlen) = &x.svlen {
        try_with!(
            record.push_info_string(b"SVLEN", &[svlen.as_bytes()]),
            "Unable to set SVLEN for output record"
        );
    }

    Ok(record)
}

/// Write the merged consensus VCF
///
/// # Arguments
/// * `filename` - Output path, '-' for stdout. Paths ending in '.gz' are bgzip compressed
/// * `records` - Consensus records in output order
///
pub fn write_merged_vcf(
    filename: &Utf8Path,
    header_info: &MergedVcfHeaderInfo,
    records: &[ConsensusRecord],
) -> SimpleResult<()> {
    let header = get_merged_vcf_header(header_info);

    let mut vcf = if filename.as_str() == STDOUT_FILENAME {
        info!("Writing merged VCF to stdout");
        try_with!(
            bcf::Writer::from_stdout(&header, true, bcf::Format::Vcf),
            "Unable to open stdout for VCF output"
        )
    } else {
        info!("Writing merged VCF to file: '{filename}'");
        let uncompressed = filename.extension() != Some("gz");
        try_with!(
            bcf::Writer::from_path(filename, &header, uncompressed, bcf::Format::Vcf),
            "Unable to create VCF output file: '{}'",
            filename
        )
    };

    for consensus_record in records.iter() {
        let record = convert_consensus_record_to_vcf_record(consensus_record, &vcf)?;
        try_with!(
            vcf.write(&record),
            "Failed to write VCF record at {}:{}",
            consensus_record.chrom,
            consensus_record.pos + 1
        );
    }
    Ok(())
}
