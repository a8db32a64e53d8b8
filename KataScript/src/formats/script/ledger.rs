//! Bookkeeping for inject: replaced text and the jumps that need fixing

use std::collections::BTreeMap;

/// A text unit that was replaced during inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentence {
    /// Original address of the replaced bytes.
    ///
    /// For a string operand this is the first payload byte (after the length
    /// prefix); for a raw text run it is the run's first byte.
    pub address: usize,
    /// Byte length of the original text.
    pub original_len: usize,
    /// Byte length of the replacement.
    pub new_len: usize,
}

impl Sentence {
    /// How far everything after this sentence moved.
    pub fn delta(&self) -> i64 {
        self.new_len as i64 - self.original_len as i64
    }
}

/// Replaced sentences keyed by original address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentenceLedger {
    sentences: BTreeMap<usize, Sentence>,
}

impl SentenceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a replaced sentence.
    pub fn record(&mut self, sentence: Sentence) {
        self.sentences.insert(sentence.address, sentence);
    }

    /// Sum of the deltas of every sentence that starts strictly before `target`.
    ///
    /// A jump to the first byte of a sentence's own text does not move with
    /// that sentence's change, only with earlier ones.
    pub fn delta_before(&self, target: usize) -> i64 {
        self.sentences
            .range(..target)
            .map(|(_, sentence)| sentence.delta())
            .sum()
    }

    /// Net size change of the whole script.
    pub fn total_delta(&self) -> i64 {
        self.sentences.values().map(Sentence::delta).sum()
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Sentences in address order.
    pub fn iter(&self) -> impl Iterator<Item = &Sentence> {
        self.sentences.values()
    }
}

/// An absolute jump operand enrolled for relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpSite {
    /// Address of the operand's value bytes in the output script.
    pub output_address: usize,
    /// Address of the operand's value bytes in the original script.
    pub source_address: usize,
    /// The original target.
    pub value: i32,
}
