//! Extraction of annotation fields from E-utilities XML responses.
//!
//! Both functions are pure: they take the response body and never touch the network,
//! which keeps every field rule testable against canned XML.

use crate::constants::{CURRENT_ASSEMBLY_STATUS, DBSNP_SOURCE, GNOMAD_SOURCE, NOT_FOUND};
use crate::error::Result;
use crate::normalize::format_percentage;
use crate::types::AnnotationDetails;
use roxmltree::{Document, Node, ParsingOptions};

/// First `<Id>` of an `esearch` result, if any.
pub fn parse_search_result(xml: &str) -> Result<Option<String>> {
    let doc = parse_document(xml)?;
    Ok(find_descendant(doc.root_element(), "Id").and_then(element_text))
}

/// Build [`AnnotationDetails`] from an `esummary` document.
///
/// Each field is extracted on its own and falls back to `"not found"`; a missing node
/// never fails the whole record.
pub fn parse_summary(xml: &str) -> Result<AnnotationDetails> {
    let doc = parse_document(xml)?;
    let root = doc.root_element();
    let text_of = |name: &str| find_descendant(root, name).and_then(element_text);

    let variation_name = text_of("variation_name");
    let protein = protein_change(variation_name.as_deref()).or_else(|| text_of("protein_change"));

    Ok(AnnotationDetails {
        gene: text_of("gene_sort").unwrap_or_else(not_found),
        nucleotide: variation_name.unwrap_or_else(not_found),
        drug_response: germline_description(root).unwrap_or_else(not_found),
        protein: protein.unwrap_or_else(not_found),
        variant_type: text_of("variant_type").unwrap_or_else(not_found),
        rs_id: dbsnp_rs_id(root).unwrap_or_else(not_found),
        position: genomic_position(root).unwrap_or_else(not_found),
        chromosome: current_assembly_text(root, "chr").unwrap_or_else(not_found),
        variant_rate: population_rate(root).unwrap_or_else(not_found),
    })
}

fn parse_document(xml: &str) -> Result<Document<'_>> {
    // esummary responses carry a DOCTYPE declaration
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    Ok(Document::parse_with_options(xml, options)?)
}

fn not_found() -> String {
    NOT_FOUND.to_string()
}

fn is_element(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

/// Trimmed text content of an element, `None` when empty.
fn element_text(node: Node) -> Option<String> {
    node.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// First strict descendant named `name`, in document order.
fn find_descendant<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.descendants().skip(1).find(|n| is_element(n, name))
}

fn find_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is_element(n, name))
}

fn child_text(node: Node, name: &str) -> Option<String> {
    find_child(node, name).and_then(element_text)
}

/// Text after the last `" ("` of a variation name with closing parentheses removed,
/// e.g. `NM_000492.4(CFTR):c.1521_1523del (p.Phe508del)` gives `p.Phe508del`.
fn protein_change(variation_name: Option<&str>) -> Option<String> {
    let name = variation_name?;
    let (_, tail) = name.rsplit_once(" (")?;
    Some(tail.replace(')', ""))
}

fn germline_description(root: Node) -> Option<String> {
    root.descendants()
        .skip(1)
        .filter(|n| is_element(n, "germline_classification"))
        .find_map(|gc| find_child(gc, "description"))
        .and_then(element_text)
}

fn dbsnp_rs_id(root: Node) -> Option<String> {
    root.descendants()
        .filter(|n| is_element(n, "variation_xref"))
        .find_map(|xref| {
            let source = child_text(xref, "db_source")?;
            let id = child_text(xref, "db_id")?;
            (source == DBSNP_SOURCE).then(|| format!("rs{}", id))
        })
}

fn current_assemblies<'a, 'input: 'a>(root: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    root.descendants().filter(|n| {
        is_element(n, "assembly_set")
            && n.children()
                .filter(|c| is_element(c, "status"))
                .any(|c| element_text(c).as_deref() == Some(CURRENT_ASSEMBLY_STATUS))
    })
}

/// Text of the first `name` element inside a current assembly set.
fn current_assembly_text(root: Node, name: &str) -> Option<String> {
    current_assemblies(root)
        .find_map(|asm| find_descendant(asm, name))
        .and_then(element_text)
}

fn genomic_position(root: Node) -> Option<String> {
    let start = current_assembly_text(root, "start")?;
    let stop = current_assembly_text(root, "stop").unwrap_or_else(|| start.clone());
    Some(format!("{}-{}", start, stop))
}

fn parse_fraction(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Highest gnomAD allele frequency as a percentage, falling back to the first
/// frequency reported by any source.
fn population_rate(root: Node) -> Option<String> {
    let frequencies: Vec<Node> = root
        .descendants()
        .filter(|n| is_element(n, "allele_freq"))
        .collect();

    let gnomad_max = frequencies
        .iter()
        .filter(|af| {
            child_text(**af, "source").is_some_and(|source| source.contains(GNOMAD_SOURCE))
        })
        .filter_map(|af| child_text(*af, "value").and_then(|v| parse_fraction(&v)))
        .fold(None, |max: Option<f64>, v| Some(max.map_or(v, |m| m.max(v))));

    let fraction = match gnomad_max {
        Some(max) => max,
        None => {
            let first = frequencies.first()?;
            parse_fraction(&child_text(*first, "value")?)?
        }
    };
    Some(format_percentage(fraction))
}
