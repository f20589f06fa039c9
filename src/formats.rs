//! Support for reading and writing various file formats.
//!
//! ### GFF3 (reading and writing)
//!
//! GFF3 is a tab-separated format for genomic features.
//! See [the GFF3 format description](https://github.com/The-Sequence-Ontology/Specifications/blob/master/gff3.md) for details.
//! Each line has nine columns: chromosome, source, feature type, start, end, score, strand, frame, and attributes.
//! Attributes are `key=value` pairs separated by `;`.
//! Value `.` denotes a missing score, strand, or frame.
//!
//! * [`is_gff_comment_line`]: Check if a line is a comment or a directive.
//! * [`GffRecord`]: A parsed feature line that can be converted into a [`Locus`].
//! * [`write_gff_locus`]: Write a locus and its sub-loci as GFF3 lines.
//!
//! ### OBO (reading)
//!
//! The OBO format stores ontologies such as the Gene Ontology.
//! [`read_obo`] reads the `[Term]` stanzas of an OBO file into [`OboTerm`] objects.
//!
//! ### Locus-term maps (reading)
//!
//! A locus-term map is a tab-separated file that assigns loci to ontology terms.
//! [`read_locus_term_map`] reads it into a map from term names to locus names.

use crate::{AttrValue, Locus, LocusError, Result, Strand};

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, BufRead, Write};


//-----------------------------------------------------------------------------

/// Returns `true` if the line is a GFF comment, a directive, or empty.
///
/// Comments start with `#` and directives with `##`.
pub fn is_gff_comment_line(line: &str) -> bool {
    let line = line.trim_end();
    line.is_empty() || line.starts_with('#')
}

/// A feature line in a GFF3 file.
///
/// Attribute values are stored as untyped strings in file order.
/// The caller decides how they are interpreted.
///
/// # Examples
///
/// ```
/// use locus_base::formats::GffRecord;
/// use locus_base::Strand;
///
/// let line = "1\tensembl\tgene\t4854\t9652\t.\t-\t.\tID=GRMZM2G059865;Name=GRMZM2G059865";
/// let record = GffRecord::parse(line, "=").unwrap();
/// assert_eq!(record.feature_type, "gene");
/// assert_eq!(record.strand, Strand::Reverse);
/// assert_eq!(record.attr("ID"), Some("GRMZM2G059865"));
///
/// let locus = record.into_locus("ID", false).unwrap();
/// assert_eq!(locus.name(), Some("GRMZM2G059865"));
/// assert_eq!(locus.length(), 4799);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct GffRecord {
    pub chromosome: String,
    pub source: String,
    pub feature_type: String,
    pub start: i64,
    pub end: i64,
    pub score: Option<f64>,
    pub strand: Strand,
    pub frame: Option<u8>,
    pub attributes: Vec<(String, String)>,
}

impl GffRecord {
    /// Number of tab-separated columns in a feature line.
    pub const COLUMNS: usize = 9;

    /// Attribute key for the score in loci built from GFF records.
    pub const SCORE_ATTR: &'static str = "score";

    /// Parses a feature line.
    ///
    /// `attr_split` separates keys from values in the attribute column (`=` for GFF3, a space for GTF).
    /// Quotes around attribute values are removed.
    /// Returns an error if the line cannot be parsed.
    pub fn parse(line: &str, attr_split: &str) -> std::result::Result<Self, String> {
        let line = line.trim_end_matches(['\n', '\r']);
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != Self::COLUMNS {
            return Err(format!("Expected {} columns, found {}", Self::COLUMNS, fields.len()));
        }

        let start = fields[3].parse::<i64>().map_err(|err| format!("Invalid start {}: {}", fields[3], err))?;
        let end = fields[4].parse::<i64>().map_err(|err| format!("Invalid end {}: {}", fields[4], err))?;
        let score = match fields[5] {
            "." => None,
            value => Some(value.parse::<f64>().map_err(|err| format!("Invalid score {}: {}", value, err))?),
        };
        let strand = fields[6].parse::<Strand>().map_err(|err| err.to_string())?;
        let frame = match fields[7] {
            "." => None,
            value => {
                let frame = value.parse::<u8>().map_err(|err| format!("Invalid frame {}: {}", value, err))?;
                if frame > 2 {
                    return Err(format!("Invalid frame {}", frame));
                }
                Some(frame)
            },
        };
        let attributes = Self::parse_attributes(fields[8], attr_split)?;

        Ok(GffRecord {
            chromosome: fields[0].to_string(),
            source: fields[1].to_string(),
            feature_type: fields[2].to_string(),
            start, end,
            score, strand, frame,
            attributes,
        })
    }

    fn parse_attributes(field: &str, attr_split: &str) -> std::result::Result<Vec<(String, String)>, String> {
        let mut result = Vec::new();
        if field == "." {
            return Ok(result);
        }
        for pair in field.split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once(attr_split).ok_or(
                format!("Invalid attribute {}", pair)
            )?;
            let value = value.trim().trim_matches('"');
            result.push((key.trim().to_string(), value.to_string()));
        }
        Ok(result)
    }

    /// Returns the value of the first attribute with the given key.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Returns the first parent listed in the given attribute.
    ///
    /// Multiple parents are separated by commas.
    pub fn parent(&self, parent_attr: &str) -> Option<&str> {
        self.attr(parent_attr).and_then(|value| value.split(',').next())
    }

    /// Converts the record into a locus.
    ///
    /// The value of attribute `id_attr` becomes the name of the locus.
    /// Attributes are stored as strings, unless `infer_types` is set and the value looks like a number or a boolean (see [`infer_attr_value`]).
    /// The score is stored as a float attribute with key [`Self::SCORE_ATTR`].
    /// Returns an error if the interval is invalid.
    pub fn into_locus(self, id_attr: &str, infer_types: bool) -> std::result::Result<Locus, String> {
        let name = self.attr(id_attr).map(String::from);
        let mut locus = Locus::new(self.chromosome, self.start, self.end).map_err(|err| err.to_string())?
            .with_source(self.source)
            .with_feature_type(self.feature_type)
            .with_strand(self.strand)
            .with_frame(self.frame);
        if let Some(name) = name {
            locus = locus.with_name(name);
        }
        for (key, value) in self.attributes {
            if infer_types && key != id_attr {
                let value = infer_attr_value(&value);
                locus.set_attr(key, value);
            } else {
                locus.set_attr(key, value);
            }
        }
        if let Some(score) = self.score {
            locus.set_attr(Self::SCORE_ATTR, score);
        }
        Ok(locus)
    }
}

/// Writes the locus and its sub-loci as GFF3 lines in depth-first order.
///
/// The name is written as attribute `ID`, and float attribute [`GffRecord::SCORE_ATTR`] goes to the score column.
/// Sub-loci get a `Parent` attribute, if the parent has a name and the sub-locus does not already have one.
pub fn write_gff_locus<T: Write>(locus: &Locus, output: &mut T) -> io::Result<()> {
    write_gff_line(locus, None, output)
}

fn write_gff_line<T: Write>(locus: &Locus, parent: Option<&str>, output: &mut T) -> io::Result<()> {
    let score = match locus.attr(GffRecord::SCORE_ATTR).and_then(|x| x.as_float()) {
        Some(score) => score.to_string(),
        None => String::from("."),
    };
    let frame = match locus.frame() {
        Some(frame) => frame.to_string(),
        None => String::from("."),
    };
    write!(
        output, "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t",
        locus.chromosome(), locus.source(), locus.feature_type(),
        locus.start(), locus.end(), score, locus.strand(), frame
    )?;

    let mut fields: Vec<String> = Vec::new();
    if let Some(name) = locus.name() {
        fields.push(format!("ID={}", name));
    }
    if let Some(parent) = parent {
        if locus.attr(Locus::PARENT_ATTR).is_none() {
            fields.push(format!("{}={}", Locus::PARENT_ATTR, parent));
        }
    }
    for (key, value) in locus.attrs().iter() {
        if (key == "ID" && locus.name().is_some()) || key == GffRecord::SCORE_ATTR {
            continue;
        }
        fields.push(format!("{}={}", key, value));
    }
    if fields.is_empty() {
        writeln!(output, ".")?;
    } else {
        writeln!(output, "{}", fields.join(";"))?;
    }

    for sublocus in locus.subloci() {
        write_gff_line(sublocus, locus.name(), output)?;
    }
    Ok(())
}

//-----------------------------------------------------------------------------

/// A `[Term]` stanza in an OBO file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OboTerm {
    /// Term identifier (e.g. `GO:0008150`).
    pub id: String,
    /// Human-readable term name, used as the term description.
    pub name: Option<String>,
    /// All other tags, with values in file order.
    pub attrs: BTreeMap<String, Vec<String>>,
}

/// Attribute listing the `is_a` parents of an OBO term.
pub const OBO_PARENT_ATTR: &str = "is_a";

/// Attribute listing the children of an OBO term, derived from `is_a` relationships.
pub const OBO_CHILDREN_ATTR: &str = "children";

/// Reads all `[Term]` stanzas from an OBO file.
///
/// Trailing ` ! comment` annotations are removed from values.
/// Other stanza types such as `[Typedef]` are skipped.
/// After reading, each term gets a [`OBO_CHILDREN_ATTR`] attribute listing the terms that declare it as an [`OBO_PARENT_ATTR`] parent.
///
/// # Errors
///
/// Passes through I/O errors.
/// Returns an error if a tag line cannot be parsed or a term has no identifier.
pub fn read_obo<R: BufRead>(reader: R) -> Result<Vec<OboTerm>> {
    let mut terms: Vec<OboTerm> = Vec::new();
    let mut current: Option<OboTerm> = None;
    let mut in_term = false;

    let mut line_num = 0;
    for line in reader.lines() {
        let line = line?;
        line_num += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('!') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            finish_obo_term(&mut terms, current.take(), line_num)?;
            in_term = line == "[Term]";
            if in_term {
                current = Some(OboTerm::default());
            }
            continue;
        }
        if !in_term {
            continue;
        }
        let (key, value) = line.split_once(':').ok_or(LocusError::Parse {
            line: line_num, message: format!("Invalid tag line {}", line),
        })?;
        let value = value.trim();
        let value = match value.split_once(" ! ") {
            Some((value, _)) => value.trim(),
            None => value,
        };
        if let Some(term) = current.as_mut() {
            match key {
                "id" => term.id = value.to_string(),
                "name" => term.name = Some(value.to_string()),
                _ => term.attrs.entry(key.to_string()).or_default().push(value.to_string()),
            }
        }
    }
    finish_obo_term(&mut terms, current.take(), line_num)?;

    // Children are the inverse of the parent relation.
    let mut children: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for term in terms.iter() {
        for parent in term.attrs.get(OBO_PARENT_ATTR).into_iter().flatten() {
            children.entry(parent.clone()).or_default().push(term.id.clone());
        }
    }
    for term in terms.iter_mut() {
        if let Some(values) = children.remove(&term.id) {
            term.attrs.insert(String::from(OBO_CHILDREN_ATTR), values);
        }
    }

    log::info!("Read {} OBO terms", terms.len());
    Ok(terms)
}

fn finish_obo_term(terms: &mut Vec<OboTerm>, term: Option<OboTerm>, line_num: usize) -> Result<()> {
    if let Some(term) = term {
        if term.id.is_empty() {
            return Err(LocusError::Parse { line: line_num, message: String::from("Term without an id") });
        }
        terms.push(term);
    }
    Ok(())
}

//-----------------------------------------------------------------------------

/// Layout of a locus-term map file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermMapParams {
    /// The first line is a header.
    pub header: bool,
    /// Column containing the locus name.
    pub locus_col: usize,
    /// Column containing the term name.
    pub term_col: usize,
    /// Column separator.
    pub separator: char,
}

impl Default for TermMapParams {
    fn default() -> Self {
        TermMapParams {
            header: true,
            locus_col: 0,
            term_col: 1,
            separator: '\t',
        }
    }
}

/// Reads a locus-term map into a map from term names to sets of locus names.
///
/// Lines starting with `#` or `!` are comments.
/// Locus names are truncated at the first `_`, which removes transcript suffixes such as `_T01`.
///
/// # Errors
///
/// Passes through I/O errors.
/// Returns an error if a line does not have the required columns.
pub fn read_locus_term_map<R: BufRead>(reader: R, params: &TermMapParams) -> Result<BTreeMap<String, BTreeSet<String>>> {
    let mut result: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if i == 0 && params.header {
            continue;
        }
        if line.starts_with('#') || line.starts_with('!') || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).split(params.separator).collect();
        let (locus, term) = match (fields.get(params.locus_col), fields.get(params.term_col)) {
            (Some(locus), Some(term)) => (*locus, *term),
            _ => return Err(LocusError::Parse { line: i + 1, message: String::from("Missing locus or term column") }),
        };
        let locus = locus.split('_').next().unwrap_or(locus).trim();
        result.entry(term.trim().to_string()).or_default().insert(locus.to_string());
    }
    Ok(result)
}

//-----------------------------------------------------------------------------

/// Interprets an untyped attribute value.
///
/// Integers, floats, and `true` / `false` get the corresponding types.
/// Everything else remains a string.
pub fn infer_attr_value(value: &str) -> AttrValue {
    if let Ok(value) = value.parse::<i64>() {
        return AttrValue::Int(value);
    }
    if let Ok(value) = value.parse::<f64>() {
        if value.is_finite() {
            return AttrValue::Float(value);
        }
    }
    match value {
        "true" => AttrValue::Bool(true),
        "false" => AttrValue::Bool(false),
        _ => AttrValue::String(value.to_string()),
    }
}

//-----------------------------------------------------------------------------
