//! Named nucleotide sequences addressed with 1-based inclusive coordinates.
//!
//! A [`Chromosome`] stores a sequence over the alphabet `AaCcGgTtUuNn`.
//! Position 1 is the first base, and ranges include both endpoints.
//! A [`Fasta`] is an ordered collection of chromosomes, usually read from a FASTA file.

use crate::{utils, LocusError, Result};

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::io::BufRead;
use std::path::{Path, PathBuf};

use regex::Regex;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// A nucleotide symbol.
///
/// Case is preserved, as lowercase symbols often denote soft-masked regions.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Nucleotide {
    A, a, C, c, G, g, T, t, U, u, N, n,
}

impl Nucleotide {
    /// Returns the symbol as a byte.
    pub fn as_byte(&self) -> u8 {
        match self {
            Nucleotide::A => b'A', Nucleotide::a => b'a',
            Nucleotide::C => b'C', Nucleotide::c => b'c',
            Nucleotide::G => b'G', Nucleotide::g => b'g',
            Nucleotide::T => b'T', Nucleotide::t => b't',
            Nucleotide::U => b'U', Nucleotide::u => b'u',
            Nucleotide::N => b'N', Nucleotide::n => b'n',
        }
    }

    /// Returns the symbol as a character.
    pub fn as_char(&self) -> char {
        self.as_byte() as char
    }
}

impl TryFrom<char> for Nucleotide {
    type Error = LocusError;

    fn try_from(value: char) -> Result<Self> {
        match value {
            'A' => Ok(Nucleotide::A), 'a' => Ok(Nucleotide::a),
            'C' => Ok(Nucleotide::C), 'c' => Ok(Nucleotide::c),
            'G' => Ok(Nucleotide::G), 'g' => Ok(Nucleotide::g),
            'T' => Ok(Nucleotide::T), 't' => Ok(Nucleotide::t),
            'U' => Ok(Nucleotide::U), 'u' => Ok(Nucleotide::u),
            'N' => Ok(Nucleotide::N), 'n' => Ok(Nucleotide::n),
            _ => Err(LocusError::Symbol(value)),
        }
    }
}

//-----------------------------------------------------------------------------

/// A named sequence of nucleotides.
///
/// Construction from a string and from a slice of [`Nucleotide`] values produce identical chromosomes.
/// Two chromosomes are equal if they have the same name and the same sequence.
///
/// # Examples
///
/// ```
/// use locus_base::Chromosome;
///
/// let chromosome = Chromosome::new("chr1", "AAACCCTTTGGG").unwrap();
/// assert_eq!(chromosome.len(), 12);
/// assert_eq!(chromosome.get(1).unwrap(), 'A');
/// assert_eq!(chromosome.get_range(1, 5).unwrap(), "AAACC");
/// assert_eq!(chromosome.get_range(5, 10).unwrap(), "CCTTTG");
/// assert!(chromosome.get(0).is_err());
/// ```
#[derive(Clone, Debug)]
pub struct Chromosome {
    name: String,
    sequence: Vec<u8>,
    attrs: Vec<String>,
}

impl Chromosome {
    /// Creates a chromosome from a string.
    ///
    /// Returns an error if the string contains a symbol outside the nucleotide alphabet.
    pub fn new<S: Into<String>>(name: S, sequence: &str) -> Result<Self> {
        let mut encoded = Vec::with_capacity(sequence.len());
        for c in sequence.chars() {
            encoded.push(Nucleotide::try_from(c)?.as_byte());
        }
        Ok(Chromosome { name: name.into(), sequence: encoded, attrs: Vec::new() })
    }

    /// Creates a chromosome from nucleotide symbols.
    pub fn from_symbols<S: Into<String>>(name: S, symbols: &[Nucleotide]) -> Self {
        let sequence = symbols.iter().map(|x| x.as_byte()).collect();
        Chromosome { name: name.into(), sequence, attrs: Vec::new() }
    }

    /// Returns the chromosome with the given header attributes.
    pub fn with_attrs(self, attrs: Vec<String>) -> Self {
        Chromosome { attrs, ..self }
    }

    /// Returns the name of the chromosome.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the length of the sequence.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Returns `true` if the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Returns the sequence as bytes.
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Returns the header attributes.
    pub fn attrs(&self) -> &[String] {
        &self.attrs
    }

    /// Returns the symbol at the given 1-based position.
    ///
    /// Returns an error if the position is outside `1..=len`.
    pub fn get(&self, position: i64) -> Result<char> {
        if position < 1 || position as u64 > self.len() as u64 {
            return Err(LocusError::Coordinate(format!(
                "Position {} is outside 1..={} in {}", position, self.len(), self.name
            )));
        }
        Ok(self.sequence[(position - 1) as usize] as char)
    }

    /// Returns the sequence in the inclusive range `start..=end`.
    ///
    /// The end is clamped to the length of the sequence.
    /// Returns an error if `start < 1`.
    pub fn get_range(&self, start: i64, end: i64) -> Result<String> {
        if start < 1 {
            return Err(LocusError::Coordinate(format!(
                "Range {}..={} starts before position 1 in {}", start, end, self.name
            )));
        }
        let high = end.clamp(0, self.len() as i64) as usize;
        let low = ((start - 1) as usize).min(high);
        Ok(String::from_utf8_lossy(&self.sequence[low..high]).into_owned())
    }
}

impl PartialEq for Chromosome {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.sequence == other.sequence
    }
}

impl Eq for Chromosome {}

impl Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 30;
        let shown = &self.sequence[..self.len().min(PREVIEW)];
        let suffix = if self.len() > PREVIEW { "..." } else { "" };
        write!(f, "Chromosome({}, {}{})", self.name, String::from_utf8_lossy(shown), suffix)
    }
}

//-----------------------------------------------------------------------------

/// An ordered collection of chromosomes.
///
/// Chromosomes can also be accessed by nicknames (e.g. `chr1` for `1`).
///
/// # Examples
///
/// ```
/// use locus_base::{Chromosome, Fasta};
///
/// let mut fasta = Fasta::new();
/// fasta.add_chrom(Chromosome::new("1", "ACGT").unwrap(), false).unwrap();
/// fasta.add_nickname("chr1", "1").unwrap();
/// assert!(fasta.contains("chr1"));
/// assert_eq!(fasta.get("chr1").unwrap().len(), 4);
/// assert!(fasta.get("2").is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Fasta {
    filename: Option<PathBuf>,
    order: Vec<String>,
    chromosomes: HashMap<String, Chromosome>,
    nicknames: HashMap<String, String>,
}

impl Fasta {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a collection from a FASTA file, which may be gzip-compressed.
    ///
    /// The first word of a header line is the chromosome name, and the remaining words are attributes.
    /// If `nickname` is given as `(pattern, replacement)`, each header (without `>`) is rewritten with the regex.
    /// If the result differs from the header, it becomes a nickname for the chromosome.
    ///
    /// # Errors
    ///
    /// Passes through I/O errors.
    /// Returns an error if a sequence line comes before the first header, if a sequence contains invalid symbols, or if a chromosome name is repeated.
    pub fn from_file<P: AsRef<Path>>(filename: P, nickname: Option<(&Regex, &str)>) -> Result<Self> {
        log::info!("Reading FASTA file {}", filename.as_ref().display());
        let reader = utils::open_file(&filename)?;
        let mut result = Fasta { filename: Some(filename.as_ref().to_path_buf()), ..Fasta::default() };

        let mut current: Option<(String, Vec<String>)> = None;
        let mut sequence = String::new();
        let mut line_num = 0;
        for line in reader.lines() {
            let line = line?;
            line_num += 1;
            let line = line.trim();
            if let Some(header) = line.strip_prefix('>') {
                if let Some((name, attrs)) = current.take() {
                    result.finish_chrom(name, attrs, &sequence, line_num - 1)?;
                    sequence.clear();
                }
                let mut fields = header.split_whitespace();
                let name = fields.next().unwrap_or("").to_string();
                let attrs: Vec<String> = fields.map(String::from).collect();
                if let Some((pattern, replacement)) = nickname {
                    let alt = pattern.replace(header, replacement);
                    if alt != header {
                        log::debug!("Found a nickname: mapping {} -> {}", alt, name);
                        result.nicknames.insert(alt.into_owned(), name.clone());
                    }
                }
                current = Some((name, attrs));
            } else if !line.is_empty() {
                if current.is_none() {
                    return Err(LocusError::Parse { line: line_num, message: String::from("Sequence before the first header") });
                }
                sequence.push_str(line);
            }
        }
        if let Some((name, attrs)) = current.take() {
            result.finish_chrom(name, attrs, &sequence, line_num)?;
        }

        log::info!("Read {} chromosomes", result.len());
        Ok(result)
    }

    fn finish_chrom(&mut self, name: String, attrs: Vec<String>, sequence: &str, line_num: usize) -> Result<()> {
        let chromosome = Chromosome::new(name, sequence).map_err(|err| LocusError::Parse {
            line: line_num, message: err.to_string(),
        })?;
        self.add_chrom(chromosome.with_attrs(attrs), false)
    }

    /// Returns the name of the file the collection was read from.
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Returns the number of chromosomes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns `true` if the collection contains a chromosome with the given name or nickname.
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    fn resolve(&self, name: &str) -> Option<&Chromosome> {
        self.chromosomes.get(name).or_else(|| {
            self.nicknames.get(name).and_then(|target| self.chromosomes.get(target))
        })
    }

    /// Returns the chromosome with the given name or nickname.
    pub fn get(&self, name: &str) -> Result<&Chromosome> {
        self.resolve(name).ok_or_else(|| {
            let source = self.filename.as_ref().map(|x| x.display().to_string()).unwrap_or_default();
            LocusError::MissingChromosome(format!("{} not in FASTA {}", name, source))
        })
    }

    /// Adds a chromosome to the end of the collection.
    ///
    /// Returns an error if a chromosome with the same name exists, unless `replace` is set.
    /// A replaced chromosome keeps its position in the order.
    pub fn add_chrom(&mut self, chromosome: Chromosome, replace: bool) -> Result<()> {
        let name = chromosome.name().to_string();
        if self.chromosomes.contains_key(&name) {
            if !replace {
                return Err(LocusError::AlreadyExists(format!("Chromosome {}", name)));
            }
        } else {
            self.order.push(name.clone());
        }
        self.chromosomes.insert(name, chromosome);
        Ok(())
    }

    /// Removes and returns a chromosome by name.
    ///
    /// Nicknames pointing to the chromosome are also removed.
    pub fn remove_chrom(&mut self, name: &str) -> Result<Chromosome> {
        let chromosome = self.chromosomes.remove(name).ok_or_else(|| LocusError::MissingChromosome(name.to_string()))?;
        self.order.retain(|x| x != name);
        self.nicknames.retain(|_, target| target != name);
        Ok(chromosome)
    }

    /// Adds a nickname for an existing chromosome.
    pub fn add_nickname(&mut self, nickname: &str, name: &str) -> Result<()> {
        if !self.chromosomes.contains_key(name) {
            return Err(LocusError::MissingChromosome(name.to_string()));
        }
        self.nicknames.insert(nickname.to_string(), name.to_string());
        Ok(())
    }

    /// Returns an iterator over the chromosomes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Chromosome> + '_ {
        self.order.iter().filter_map(|name| self.chromosomes.get(name))
    }
}

//-----------------------------------------------------------------------------
