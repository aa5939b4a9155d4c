#![allow(dead_code)]

use async_trait::async_trait;
use clinvar_annotator::app::ports::{HttpClientPort, HttpGetResult};
use reqwest::Url;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Offline stand-in for E-utilities: answers esearch by `term` and esummary by `id`.
#[derive(Default)]
pub struct ScriptedEutils {
    search: HashMap<String, String>,
    summaries: HashMap<String, String>,
    failing_status: Option<u16>,
    pub search_calls: AtomicUsize,
    pub summary_calls: AtomicUsize,
}

impl ScriptedEutils {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `rsid` resolve to `uid` with the given esummary body.
    pub fn with_variant(mut self, rsid: &str, uid: &str, summary_body: &str) -> Self {
        self.search.insert(rsid.to_string(), search_xml(Some(uid)));
        self.summaries.insert(uid.to_string(), summary_xml(uid, summary_body));
        self
    }

    pub fn failing_with(mut self, status: u16) -> Self {
        self.failing_status = Some(status);
        self
    }

    pub fn searches(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn summaries(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpClientPort for ScriptedEutils {
    async fn get(&self, url: &str) -> Result<HttpGetResult, String> {
        let url = Url::parse(url).map_err(|e| e.to_string())?;
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(params.get("db").map(String::as_str), Some("clinvar"));

        let body = if url.path().ends_with("/esearch.fcgi") {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            let term = params.get("term").cloned().unwrap_or_default();
            self.search.get(&term).cloned().unwrap_or_else(|| search_xml(None))
        } else if url.path().ends_with("/esummary.fcgi") {
            self.summary_calls.fetch_add(1, Ordering::SeqCst);
            let id = params.get("id").cloned().unwrap_or_default();
            self.summaries
                .get(&id)
                .cloned()
                .ok_or_else(|| format!("no summary scripted for id {}", id))?
        } else {
            return Err(format!("unexpected endpoint {}", url));
        };

        Ok(HttpGetResult {
            status: self.failing_status.unwrap_or(200),
            bytes: body.into_bytes(),
            content_type: "text/xml; charset=UTF-8".to_string(),
        })
    }
}

pub fn search_xml(uid: Option<&str>) -> String {
    let ids = uid.map(|id| format!("<Id>{}</Id>", id)).unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" ?>
<!DOCTYPE eSearchResult PUBLIC "-//NLM//DTD esearch 20060628//EN" "https://eutils.ncbi.nlm.nih.gov/eutils/dtd/20060628/esearch.dtd">
<eSearchResult><Count>{}</Count><RetMax>{}</RetMax><RetStart>0</RetStart><IdList>{}</IdList></eSearchResult>"#,
        uid.is_some() as u8,
        uid.is_some() as u8,
        ids
    )
}

pub fn summary_xml(uid: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" ?>
<!DOCTYPE eSummaryResult PUBLIC "-//NLM//DTD esummary clinvar 20131106//EN" "https://eutils.ncbi.nlm.nih.gov/eutils/dtd/20131106/esummary_clinvar.dtd">
<eSummaryResult><DocumentSummarySet status="OK"><DbBuild>Build250101-0000.1</DbBuild><DocumentSummary uid="{}">{}</DocumentSummary></DocumentSummarySet></eSummaryResult>"#,
        uid, body
    )
}

/// Summary body for CFTR p.Phe508del, trimmed to the fields the annotator reads.
pub const CFTR_SUMMARY: &str = "\
<obj_type>Variation</obj_type>\
<accession>VCV000007105</accession>\
<title>NM_000492.4(CFTR):c.1521_1523del (p.Phe508del)</title>\
<variation_set><variation>\
<measure_id>22164</measure_id>\
<variation_xrefs>\
<variation_xref><db_source>OMIM</db_source><db_id>602421.0001</db_id></variation_xref>\
<variation_xref><db_source>dbSNP</db_source><db_id>113993960</db_id></variation_xref>\
</variation_xrefs>\
<variation_name>NM_000492.4(CFTR):c.1521_1523del (p.Phe508del)</variation_name>\
<cdna_change>c.1521_1523del</cdna_change>\
<variation_loc>\
<assembly_set><status>previous</status><assembly_name>GRCh37</assembly_name><chr>7</chr><start>117199644</start><stop>117199646</stop></assembly_set>\
<assembly_set><status>current</status><assembly_name>GRCh38</assembly_name><chr>7</chr><start>117559590</start><stop>117559592</stop></assembly_set>\
</variation_loc>\
<variant_type>Deletion</variant_type>\
<allele_freq_set>\
<allele_freq><source>1000 Genomes Project</source><value>0.00419</value></allele_freq>\
<allele_freq><source>gnomAD exomes</source><value>0.00732</value></allele_freq>\
<allele_freq><source>gnomAD genomes</source><value>0.01154</value></allele_freq>\
</allele_freq_set>\
</variation></variation_set>\
<germline_classification><description>Pathogenic</description><last_evaluated>2024/01/01 00:00</last_evaluated></germline_classification>\
<genes><gene><symbol>CFTR</symbol><GeneID>1080</GeneID></gene></genes>\
<gene_sort>CFTR</gene_sort>\
<protein_change>F508del</protein_change>";

pub const VCF_HEADER: &str = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE1\n";
