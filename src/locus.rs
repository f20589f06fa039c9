//! Genomic intervals with strand, type, annotations, and sub-loci.
//!
//! A [`Locus`] is an interval `[start, end]` on a named chromosome.
//! Coordinates are 1-based and inclusive: position 1 is the first base of the chromosome, and the interval includes both endpoints.
//! The core fields of a locus are fixed at construction.
//! Annotations are stored in a typed attribute bag ([`AttrValue`]), and a locus may own an ordered list of sub-loci (e.g. the exons of a gene).
//!
//! Equality and the content hash ([`Locus::content_hash`]) are structural.
//! Neither of them depends on the name or the source of the locus.
//! This makes it possible to find unnamed loci in a [`crate::LocusStore`] by their structure.

use crate::{LocusError, Result};

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use xxhash_rust::xxh64::xxh64;


//-----------------------------------------------------------------------------

/// Strand of a locus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strand {
    /// Forward strand (`+`).
    #[default]
    Forward,
    /// Reverse strand (`-`).
    Reverse,
    /// Strand is not specified (`.`).
    Unknown,
}

impl Strand {
    /// Returns the string representation used in GFF files and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strand::Forward => "+",
            Strand::Reverse => "-",
            Strand::Unknown => ".",
        }
    }

    /// Returns the opposite strand.
    ///
    /// [`Strand::Unknown`] stays unknown.
    pub fn flip(&self) -> Self {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
            Strand::Unknown => Strand::Unknown,
        }
    }

    /// Returns `true` if the strand is either `+` or `-`.
    pub fn is_known(&self) -> bool {
        *self != Strand::Unknown
    }
}

impl FromStr for Strand {
    type Err = LocusError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            "." | "" => Ok(Strand::Unknown),
            _ => Err(LocusError::Strand(format!("Invalid strand {:?}", s))),
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//-----------------------------------------------------------------------------

/// A typed attribute value.
///
/// The type is stored alongside the value in the database, so that it can be recovered on read.
/// Type codes follow the SAM/GFA optional field convention: `Z` (string), `i` (integer), `f` (float), and `b` (boolean).
///
/// # Examples
///
/// ```
/// use locus_base::AttrValue;
///
/// let value = AttrValue::from(42);
/// assert_eq!(value.type_code(), 'i');
/// assert_eq!(value.to_string(), "42");
/// assert_eq!(AttrValue::from_parts('i', "42"), Ok(value));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    /// A string.
    String(String),
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A boolean value.
    Bool(bool),
}

impl AttrValue {
    /// Returns the type code of the value.
    pub fn type_code(&self) -> char {
        match self {
            AttrValue::String(_) => 'Z',
            AttrValue::Int(_) => 'i',
            AttrValue::Float(_) => 'f',
            AttrValue::Bool(_) => 'b',
        }
    }

    /// Builds a value from a type code and a string representation.
    ///
    /// Returns an error message if the type is unsupported or the value cannot be parsed.
    pub fn from_parts(type_code: char, value: &str) -> std::result::Result<Self, String> {
        match type_code {
            'Z' => Ok(AttrValue::String(value.to_string())),
            'i' => value.parse::<i64>().map(AttrValue::Int).map_err(|err| {
                format!("Invalid int value {}: {}", value, err)
            }),
            'f' => value.parse::<f64>().map(AttrValue::Float).map_err(|err| {
                format!("Invalid float value {}: {}", value, err)
            }),
            'b' => match value {
                "0" | "false" => Ok(AttrValue::Bool(false)),
                "1" | "true" => Ok(AttrValue::Bool(true)),
                _ => Err(format!("Invalid bool value {}", value)),
            },
            _ => Err(format!("Unsupported value type: {}", type_code)),
        }
    }

    /// Returns the value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value as an integer, if it is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value as a float, if it is numeric.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttrValue::Int(value) => Some(*value as f64),
            AttrValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value as a boolean, if it is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

impl Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::String(value) => write!(f, "{}", value),
            AttrValue::Int(value) => write!(f, "{}", value),
            AttrValue::Float(value) => write!(f, "{}", value),
            AttrValue::Bool(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(value as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// Attribute bag of a locus.
///
/// An empty map does not allocate, so a locus without annotations is as cheap as one with an explicit empty map.
pub type Attributes = BTreeMap<String, AttrValue>;

//-----------------------------------------------------------------------------

/// A genomic interval with optional strand, type, name, annotations, and sub-loci.
///
/// Loci are built with [`Locus::new`] and the `with_*` methods.
/// Loci read from a [`crate::LocusStore`] also know their store identifier ([`Locus::lid`]).
///
/// # Examples
///
/// ```
/// use locus_base::{Locus, Strand};
///
/// let gene = Locus::new("1", 100, 200).unwrap()
///     .with_feature_type("gene")
///     .with_strand(Strand::Reverse)
///     .with_name("gene_a")
///     .with_attr("biotype", "protein_coding");
/// assert_eq!(gene.length(), 101);
/// assert_eq!(gene.stranded_start().unwrap(), 200);
/// assert_eq!(gene.upstream(50).unwrap(), 250);
///
/// // Name does not affect equality.
/// let other = gene.clone().with_name("gene_b");
/// assert_eq!(gene, other);
/// assert_eq!(gene.content_hash(), other.content_hash());
///
/// // Invalid intervals are rejected.
/// assert!(Locus::new("1", 200, 100).is_err());
/// ```
#[derive(Clone, Debug)]
pub struct Locus {
    lid: Option<usize>,
    chromosome: String,
    start: i64,
    end: i64,
    source: String,
    feature_type: String,
    strand: Strand,
    frame: Option<u8>,
    name: Option<String>,
    attrs: Attributes,
    subloci: Vec<Locus>,
}

/// Construction.
impl Locus {
    /// Default source for new loci.
    pub const DEFAULT_SOURCE: &'static str = "locus-base";

    /// Default feature type for new loci.
    pub const DEFAULT_FEATURE_TYPE: &'static str = "locus";

    /// Default parent attribute used in GFF files.
    pub const PARENT_ATTR: &'static str = "Parent";

    /// Creates a new locus on the `+` strand with default source and feature type.
    ///
    /// Returns an error if `start > end`.
    pub fn new<S: Into<String>>(chromosome: S, start: i64, end: i64) -> Result<Self> {
        if start > end {
            return Err(LocusError::InvalidRange { start, end });
        }
        Ok(Locus {
            lid: None,
            chromosome: chromosome.into(),
            start, end,
            source: String::from(Self::DEFAULT_SOURCE),
            feature_type: String::from(Self::DEFAULT_FEATURE_TYPE),
            strand: Strand::default(),
            frame: None,
            name: None,
            attrs: Attributes::new(),
            subloci: Vec::new(),
        })
    }

    /// Returns the locus with the given source.
    pub fn with_source<S: Into<String>>(self, source: S) -> Self {
        Locus { source: source.into(), ..self }
    }

    /// Returns the locus with the given feature type.
    pub fn with_feature_type<S: Into<String>>(self, feature_type: S) -> Self {
        Locus { feature_type: feature_type.into(), ..self }
    }

    /// Returns the locus with the given strand.
    pub fn with_strand(self, strand: Strand) -> Self {
        Locus { strand, ..self }
    }

    /// Returns the locus with the given frame.
    pub fn with_frame(self, frame: Option<u8>) -> Self {
        Locus { frame, ..self }
    }

    /// Returns the locus with the given name.
    pub fn with_name<S: Into<String>>(self, name: S) -> Self {
        Locus { name: Some(name.into()), ..self }
    }

    /// Returns the locus with an additional attribute.
    pub fn with_attr<K: Into<String>, V: Into<AttrValue>>(mut self, key: K, value: V) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Returns the locus with the given attributes, replacing the existing ones.
    pub fn with_attrs(self, attrs: Attributes) -> Self {
        Locus { attrs, ..self }
    }

    /// Returns the locus with an additional sub-locus.
    pub fn with_sublocus(mut self, locus: Locus) -> Self {
        self.subloci.push(locus);
        self
    }

    // Used by the store when materializing loci.
    pub(crate) fn set_lid(&mut self, lid: usize) {
        self.lid = Some(lid);
    }

    pub(crate) fn subloci_mut(&mut self) -> &mut Vec<Locus> {
        &mut self.subloci
    }
}

//-----------------------------------------------------------------------------

/// Core fields.
impl Locus {
    /// Returns the store identifier, if the locus was read from a store.
    #[inline]
    pub fn lid(&self) -> Option<usize> {
        self.lid
    }

    #[inline]
    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    #[inline]
    pub fn start(&self) -> i64 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> i64 {
        self.end
    }

    /// Returns `(start, end)`.
    #[inline]
    pub fn coordinates(&self) -> (i64, i64) {
        (self.start, self.end)
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn feature_type(&self) -> &str {
        &self.feature_type
    }

    #[inline]
    pub fn strand(&self) -> Strand {
        self.strand
    }

    #[inline]
    pub fn frame(&self) -> Option<u8> {
        self.frame
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the length of the interval, including both endpoints.
    #[inline]
    pub fn length(&self) -> usize {
        (self.end - self.start).unsigned_abs() as usize + 1
    }

    /// Returns the center position of the interval.
    ///
    /// The center of an even-length interval falls halfway between two bases.
    pub fn center(&self) -> f64 {
        self.start as f64 + self.length() as f64 / 2.0
    }

    /// Returns a deterministic hash of the core fields and the hashes of the sub-loci.
    ///
    /// The hash depends on chromosome, start, end, feature type, strand, frame, and the sub-loci in order.
    /// It does not depend on the name, the source, or the attributes.
    pub fn content_hash(&self) -> u64 {
        let frame = match self.frame {
            Some(frame) => frame.to_string(),
            None => String::from("."),
        };
        let mut buffer = format!(
            "{}_{}_{}_{}_{}_{}",
            self.chromosome, self.start, self.end, self.feature_type, self.strand, frame
        );
        for sublocus in self.subloci.iter() {
            buffer.push('_');
            buffer.push_str(&sublocus.content_hash().to_string());
        }
        xxh64(buffer.as_bytes(), 0)
    }

    /// Compares the positions of two loci.
    ///
    /// Loci are ordered by chromosome name (as strings) and then by start position.
    /// This is coarser than equality: distinct loci may compare as [`Ordering::Equal`].
    pub fn position_cmp(&self, other: &Locus) -> Ordering {
        self.chromosome.cmp(&other.chromosome).then(self.start.cmp(&other.start))
    }
}

//-----------------------------------------------------------------------------

/// Strand-aware positions.
impl Locus {
    fn require_strand(&self) -> Result<()> {
        if self.strand.is_known() {
            Ok(())
        } else {
            Err(LocusError::Strand(format!("Locus {} does not have a strand", self)))
        }
    }

    /// Returns the 5'-most position of the locus.
    ///
    /// Returns an error if the strand is unknown.
    pub fn stranded_start(&self) -> Result<i64> {
        self.require_strand()?;
        Ok(if self.strand == Strand::Forward { self.start } else { self.end })
    }

    /// Returns the 3'-most position of the locus.
    ///
    /// Returns an error if the strand is unknown.
    pub fn stranded_end(&self) -> Result<i64> {
        self.require_strand()?;
        Ok(if self.strand == Strand::Forward { self.end } else { self.start })
    }

    /// Returns the position `distance` bp upstream (5') of the locus.
    ///
    /// On the `+` strand, the position is clamped to 0.
    /// On the `-` strand, the position is not clamped.
    /// Returns an error if the strand is unknown.
    pub fn upstream(&self, distance: i64) -> Result<i64> {
        self.require_strand()?;
        Ok(match self.strand {
            Strand::Forward => self.start.saturating_sub(distance).max(0),
            _ => self.end.saturating_add(distance),
        })
    }

    /// Returns the position `distance` bp downstream (3') of the locus.
    ///
    /// The position is never clamped, so it may be negative on the `-` strand.
    /// Returns an error if the strand is unknown.
    pub fn downstream(&self, distance: i64) -> Result<i64> {
        self.require_strand()?;
        Ok(match self.strand {
            Strand::Forward => self.end.saturating_add(distance),
            _ => self.start.max(0).saturating_sub(distance),
        })
    }

    /// Returns the number of bases between the loci, excluding the endpoints of both.
    ///
    /// Overlapping loci have a negative distance.
    /// Returns [`None`] if the loci are on different chromosomes.
    ///
    /// ```text
    /// Locus A             Locus B
    /// ==========---------=========
    /// 1       10         20      30
    /// ```
    ///
    /// The distance between A and B is 9.
    pub fn distance(&self, other: &Locus) -> Option<i64> {
        if self.chromosome != other.chromosome {
            return None;
        }
        let (first, second) = if self.position_cmp(other) == Ordering::Greater { (other, self) } else { (self, other) };
        Some(second.start - first.end - 1)
    }

    /// Returns the distance between the centers of the loci, rounded down.
    ///
    /// Returns [`None`] if the loci are on different chromosomes.
    pub fn center_distance(&self, other: &Locus) -> Option<i64> {
        if self.chromosome != other.chromosome {
            return None;
        }
        Some((self.center() - other.center()).abs().floor() as i64)
    }

    /// Returns a new locus spanning both loci, with both of them as sub-loci.
    ///
    /// The new locus has the default source and feature type, and its strand is unknown.
    /// Returns an error if the loci are on different chromosomes.
    pub fn combine(&self, other: &Locus) -> Result<Locus> {
        if self.chromosome != other.chromosome {
            return Err(LocusError::ChromosomeMismatch(self.chromosome.clone(), other.chromosome.clone()));
        }
        let start = self.start.min(other.start);
        let end = self.end.max(other.end);
        let combined = Locus::new(self.chromosome.clone(), start, end)?
            .with_strand(Strand::Unknown)
            .with_sublocus(self.clone())
            .with_sublocus(other.clone());
        Ok(combined)
    }
}

//-----------------------------------------------------------------------------

/// Attributes and sub-loci.
impl Locus {
    /// Returns the attributes of the locus.
    #[inline]
    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    /// Returns the value of the attribute, or [`None`] if it does not exist.
    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    /// Returns the value of the attribute or the given default value.
    pub fn attr_or(&self, key: &str, default: AttrValue) -> AttrValue {
        self.attrs.get(key).cloned().unwrap_or(default)
    }

    /// Inserts or replaces an attribute.
    pub fn set_attr<K: Into<String>, V: Into<AttrValue>>(&mut self, key: K, value: V) {
        self.attrs.insert(key.into(), value.into());
    }

    /// Returns the sub-loci in insertion order.
    #[inline]
    pub fn subloci(&self) -> &[Locus] {
        &self.subloci
    }

    /// Appends a sub-locus.
    pub fn add_sublocus(&mut self, locus: Locus) {
        self.subloci.push(locus);
    }

    /// Appends a sub-locus to the right parent in the hierarchy rooted at this locus.
    ///
    /// The parent is the locus whose name matches the value of attribute `parent_attr` in the new locus.
    /// It may be this locus or any of its descendants.
    ///
    /// # Errors
    ///
    /// Returns an error if the new locus does not have the parent attribute or if the parent cannot be found.
    pub fn add_sublocus_by_parent(&mut self, locus: Locus, parent_attr: &str) -> Result<()> {
        let parent = match locus.attr(parent_attr) {
            Some(value) => value.to_string(),
            None => return Err(LocusError::MissingAttribute(String::from(parent_attr))),
        };
        if self.name.as_deref() == Some(parent.as_str()) {
            self.subloci.push(locus);
            return Ok(());
        }
        match self.find_sublocus_mut(&parent) {
            Some(target) => {
                target.subloci.push(locus);
                Ok(())
            },
            None => Err(LocusError::MissingLocus(format!("parent {}", parent))),
        }
    }

    /// Returns the first descendant with the given name in depth-first order.
    pub fn find_sublocus(&self, name: &str) -> Option<&Locus> {
        self.subloci.iter().find_map(|child| {
            if child.name.as_deref() == Some(name) { Some(child) } else { child.find_sublocus(name) }
        })
    }

    /// Returns a mutable reference to the first descendant with the given name in depth-first order.
    pub fn find_sublocus_mut(&mut self, name: &str) -> Option<&mut Locus> {
        self.subloci.iter_mut().find_map(|child| {
            if child.name.as_deref() == Some(name) { Some(child) } else { child.find_sublocus_mut(name) }
        })
    }

    /// Returns the total number of descendants.
    pub fn descendants(&self) -> usize {
        self.subloci.iter().map(|child| 1 + child.descendants()).sum()
    }

    /// Renders the sub-locus hierarchy as an indented tree of `feature_type:name` labels.
    pub fn as_tree(&self) -> String {
        let mut result = String::new();
        self.append_tree(&mut result, 0);
        result
    }

    fn append_tree(&self, buffer: &mut String, depth: usize) {
        for _ in 0..depth {
            buffer.push_str("  ");
        }
        buffer.push_str(&self.feature_type);
        buffer.push(':');
        buffer.push_str(self.name.as_deref().unwrap_or("None"));
        buffer.push('\n');
        for child in self.subloci.iter() {
            child.append_tree(buffer, depth + 1);
        }
    }
}

//-----------------------------------------------------------------------------

impl PartialEq for Locus {
    fn eq(&self, other: &Self) -> bool {
        self.chromosome == other.chromosome
            && self.start == other.start
            && self.end == other.end
            && self.feature_type == other.feature_type
            && self.strand == other.strand
            && self.frame == other.frame
            && self.subloci == other.subloci
            && self.attrs == other.attrs
    }
}

impl Hash for Locus {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.content_hash());
    }
}

impl Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f, "Locus({},{},{},source={},feature_type='{}',strand='{}',",
            self.chromosome, self.start, self.end, self.source, self.feature_type, self.strand
        )?;
        match self.frame {
            Some(frame) => write!(f, "frame='{}',", frame)?,
            None => write!(f, "frame='None',")?,
        }
        write!(f, "name='{}',attrs={{", self.name.as_deref().unwrap_or("None"))?;
        for (i, (key, value)) in self.attrs.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}:{}", key, value)?;
        }
        write!(f, "}},subloci=[{} subloci])", self.subloci.len())
    }
}

//-----------------------------------------------------------------------------
