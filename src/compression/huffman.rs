
//! Huffman compression and decompression of byte sequences.
//!
//! The code is built from the frequencies of the bytes in the input,
//! and stored next to the packed bits as a table of `(byte, code, length)` entries.
//! Codes are packed most significant bit first. The last byte of the packed data
//! may contain unused padding bits, which is why the exact number of bits is stored too.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::convert::TryFrom;
use bit_field::BitField;
use crate::error::{Error, Result, UnitResult, usize_to_u64, u64_to_usize};


/// Codes longer than this cannot be stored.
/// Would require more than ten terabytes of input with a pathological distribution.
pub const MAX_CODE_LENGTH: u8 = 64;

const BYTE_VALUES: usize = 256;

const INVALID_CODE: &str = "bit sequence does not match any code";
const UNFINISHED_CODE: &str = "bit stream ends inside a code";
const MISSING_BITS: &str = "bit count exceeds the packed bytes";


/// A variable length bit sequence. Only the lowest `length` bits are used,
/// and the most significant of those is the first bit in the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Code {

    /// The bits of the code, right aligned.
    pub bits: u64,

    /// Number of bits in this code, within `1 ..= MAX_CODE_LENGTH`.
    pub length: u8,
}

impl Code {

    /// Whether this code is a prefix of the other code, or equal to it.
    pub fn is_prefix_of(self, other: Code) -> bool {
        self.length <= other.length
            && other.bits >> (other.length - self.length) == self.bits
    }

    /// The bit at the specified position, counting from the first bit in the stream.
    #[inline]
    fn bit(self, index: u8) -> bool {
        (self.bits >> (self.length - 1 - index)) & 1 == 1
    }
}

/// Assigns a code to a byte value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CodeEntry {

    /// The value of the byte in the uncompressed sequence.
    pub byte: u8,

    /// The bits that represent the byte in the compressed sequence.
    pub code: Code,
}

/// The codes of all bytes that occur in a sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeTable {
    entries: Vec<CodeEntry>,
}

impl CodeTable {

    /// Use the specified entries without checking them.
    /// Decoding checks that the codes are well-formed and prefix free.
    pub fn from_entries(entries: Vec<CodeEntry>) -> Self {
        CodeTable { entries }
    }

    /// All entries, ordered by byte value if built by `encode`.
    #[inline]
    pub fn entries(&self) -> &[CodeEntry] {
        &self.entries
    }

    /// Number of distinct bytes with a code.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no byte has a code, which is the case for an empty input.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The code of the byte, if the byte occurs in the input.
    pub fn code_of(&self, byte: u8) -> Option<Code> {
        self.entries.iter().find(|entry| entry.byte == byte).map(|entry| entry.code)
    }

    /// Returns `Error::Invalid` if the table cannot be used for decoding:
    /// codes that are empty, too long, or wider than their length,
    /// duplicate byte values, and codes that are a prefix of other codes.
    pub fn validate(&self) -> UnitResult {
        DecodingTree::build(self).map(|_| ())
    }
}


/// The result of encoding a byte sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Encoded {

    /// The codes of the input, packed most significant bit first.
    /// Contains `ceil(bit_count / 8)` bytes.
    pub packed: Vec<u8>,

    /// The code of each distinct byte of the input.
    pub table: CodeTable,

    /// The number of meaningful bits in `packed`.
    pub bit_count: u64,
}


/// Build a code from the byte frequencies and pack the input with it.
/// Bytes that occur more often get shorter codes.
pub fn encode(uncompressed: &[u8]) -> Result<Encoded> {
    let mut frequencies = [0_u64; BYTE_VALUES];
    for &byte in uncompressed {
        frequencies[usize::from(byte)] += 1;
    }

    let table = build_code_table(&frequencies)?;

    let mut codes: [Option<Code>; BYTE_VALUES] = [None; BYTE_VALUES];
    for entry in table.entries() {
        codes[usize::from(entry.byte)] = Some(entry.code);
    }

    let mut writer = BitWriter::with_capacity(uncompressed.len() / 2);
    for &byte in uncompressed {
        let code = codes[usize::from(byte)].expect("every input byte has a code");
        writer.write_code(code);
    }

    let (packed, bit_count) = writer.finish();
    tracing::trace!(symbols = table.len(), bit_count, "huffman encoded");

    Ok(Encoded { packed, table, bit_count })
}

/// Unpack exactly `bit_count` bits using the code table.
/// Fails if the table is not prefix free, if the bits do not match a code,
/// or if the bits end inside a code.
pub fn decode(packed: &[u8], table: &CodeTable, bit_count: u64) -> Result<Vec<u8>> {
    let available_bits = usize_to_u64(packed.len()).checked_mul(8)
        .ok_or_else(|| Error::invalid(MISSING_BITS))?;

    if bit_count > available_bits {
        return Err(Error::invalid(MISSING_BITS));
    }

    let tree = DecodingTree::build(table)?;
    let bit_count = u64_to_usize(bit_count, MISSING_BITS)?;

    let shortest_code = table.entries().iter().map(|entry| usize::from(entry.code.length)).min().unwrap_or(1);
    let mut decoded = Vec::with_capacity(bit_count / shortest_code);
    let mut node = DecodingTree::ROOT;

    for bit_index in 0 .. bit_count {
        let bit = packed[bit_index / 8].get_bit(7 - bit_index % 8);

        match tree.child(node, bit) {
            None => return Err(Error::invalid(INVALID_CODE)),
            Some(Node::Leaf(byte)) => {
                decoded.push(byte);
                node = DecodingTree::ROOT;
            },
            Some(Node::Branch(_)) => {
                node = tree.child_index(node, bit);
            },
        }
    }

    if node != DecodingTree::ROOT {
        return Err(Error::invalid(UNFINISHED_CODE));
    }

    Ok(decoded)
}


/// A binary tree built from a code table,
/// walked bit by bit from the root until a leaf is reached.
#[derive(Debug)]
struct DecodingTree {
    nodes: Vec<Node>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Node {

    /// Indices of the children for the bits zero and one.
    /// The root is never a child, so index zero marks a missing child.
    Branch([u32; 2]),

    /// A complete code was read.
    Leaf(u8),
}

impl DecodingTree {
    const ROOT: usize = 0;

    fn build(table: &CodeTable) -> Result<Self> {
        let mut tree = DecodingTree { nodes: Vec::with_capacity(2 * table.len()) };
        tree.nodes.push(Node::Branch([0, 0]));

        let mut has_code = [false; BYTE_VALUES];

        for entry in table.entries() {
            let Code { bits, length } = entry.code;

            if length == 0 || length > MAX_CODE_LENGTH {
                return Err(Error::invalid(format!("code length {} of byte {}", length, entry.byte)));
            }

            if length < MAX_CODE_LENGTH && bits >> length != 0 {
                return Err(Error::invalid(format!("code of byte {} is wider than its length", entry.byte)));
            }

            if std::mem::replace(&mut has_code[usize::from(entry.byte)], true) {
                return Err(Error::invalid(format!("byte {} has more than one code", entry.byte)));
            }

            tree.insert(entry.code, entry.byte)?;
        }

        Ok(tree)
    }

    fn insert(&mut self, code: Code, byte: u8) -> UnitResult {
        let mut node = Self::ROOT;

        for bit_index in 0 .. code.length {
            let bit = code.bit(bit_index);
            let is_last_bit = bit_index + 1 == code.length;

            let child = match self.child(node, bit) {
                Some(Node::Leaf(_)) => return Err(Error::invalid(
                    "code table is not prefix free"
                )),

                Some(Node::Branch(_)) if is_last_bit => return Err(Error::invalid(
                    "code table is not prefix free"
                )),

                Some(Node::Branch(_)) => self.child_index(node, bit),

                None => {
                    let child = self.nodes.len();
                    let child_reference = u32::try_from(child)
                        .map_err(|_| Error::invalid("code table too large"))?;

                    self.nodes.push(if is_last_bit { Node::Leaf(byte) } else { Node::Branch([0, 0]) });

                    if let Node::Branch(children) = &mut self.nodes[node] {
                        children[usize::from(bit)] = child_reference;
                    }

                    child
                }
            };

            node = child;
        }

        Ok(())
    }

    /// The child of a branch node, or `None` if the code table has no such code.
    #[inline]
    fn child(&self, node: usize, bit: bool) -> Option<Node> {
        match self.nodes[node] {
            Node::Branch(children) => match children[usize::from(bit)] {
                0 => None,
                child => Some(self.nodes[child as usize]),
            },

            Node::Leaf(_) => None,
        }
    }

    #[inline]
    fn child_index(&self, node: usize, bit: bool) -> usize {
        match self.nodes[node] {
            Node::Branch(children) => children[usize::from(bit)] as usize,
            Node::Leaf(_) => Self::ROOT,
        }
    }
}


/// Appends codes to a byte vector, most significant bit first.
#[derive(Debug, Default)]
struct BitWriter {
    bytes: Vec<u8>,
    bit_count: u64,
}

impl BitWriter {
    fn with_capacity(byte_count: usize) -> Self {
        BitWriter { bytes: Vec::with_capacity(byte_count), bit_count: 0 }
    }

    #[inline]
    fn write_code(&mut self, code: Code) {
        for bit_index in 0 .. code.length {
            self.write_bit(code.bit(bit_index));
        }
    }

    #[inline]
    fn write_bit(&mut self, bit: bool) {
        let bit_in_byte = (self.bit_count % 8) as usize;
        if bit_in_byte == 0 {
            self.bytes.push(0);
        }

        if bit {
            if let Some(last) = self.bytes.last_mut() {
                last.set_bit(7 - bit_in_byte, true);
            }
        }

        self.bit_count += 1;
    }

    fn finish(self) -> (Vec<u8>, u64) {
        (self.bytes, self.bit_count)
    }
}


/// Entries of the priority queue while building the code.
/// The queue pops the lowest frequency first.
/// Equal frequencies are ordered by symbol, so the code is identical on all platforms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct HeapFrequency {
    position: usize,
    frequency: u64,
}

impl Ord for HeapFrequency {
    fn cmp(&self, other: &Self) -> Ordering {
        other.frequency.cmp(&self.frequency)
            .then_with(|| other.position.cmp(&self.position))
    }
}

impl PartialOrd for HeapFrequency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compute the code length of each byte that has a non-zero frequency.
///
/// Conceptually builds a tree by repeatedly merging the two least frequent nodes,
/// where the depth of a leaf is its code length.
/// Instead of allocating the tree, the leaves of each node are kept in a linked list,
/// and the length of every leaf in both lists grows by one bit whenever two nodes are merged.
fn build_code_lengths(frequencies: &[u64; BYTE_VALUES]) -> [u32; BYTE_VALUES] {
    let mut lengths = [0_u32; BYTE_VALUES];

    // the list of leaves below a node, ending where `next_leaf[index] == index`
    let mut next_leaf = [0_usize; BYTE_VALUES];
    for (index, next) in next_leaf.iter_mut().enumerate() { *next = index; }

    let mut heap: BinaryHeap<HeapFrequency> = frequencies.iter().enumerate()
        .filter(|&(_, &frequency)| frequency != 0)
        .map(|(position, &frequency)| HeapFrequency { position, frequency })
        .collect();

    // a single distinct byte still needs one bit per occurrence
    if heap.len() == 1 {
        if let Some(single) = heap.peek() {
            lengths[single.position] = 1;
        }

        return lengths;
    }

    while heap.len() > 1 {
        let (lowest, mut second) = match (heap.pop(), heap.pop()) {
            (Some(lowest), Some(second)) => (lowest, second),
            _ => unreachable!("heap has at least two entries"),
        };

        second.frequency += lowest.frequency;
        heap.push(second);

        // add a bit to all codes in the first list, then append the second list
        let mut leaf = second.position;
        loop {
            lengths[leaf] += 1;

            if next_leaf[leaf] == leaf {
                next_leaf[leaf] = lowest.position;
                break;
            }

            leaf = next_leaf[leaf];
        }

        // add a bit to all codes in the second list
        let mut leaf = lowest.position;
        loop {
            lengths[leaf] += 1;

            if next_leaf[leaf] == leaf {
                break;
            }

            leaf = next_leaf[leaf];
        }
    }

    lengths
}

/// Assign canonical codes: shorter codes first, and bytes of equal length in increasing order.
/// Consecutive codes of one length are consecutive numbers, which makes the code prefix free.
fn build_code_table(frequencies: &[u64; BYTE_VALUES]) -> Result<CodeTable> {
    let lengths = build_code_lengths(frequencies);

    let mut symbols: Vec<(u32, u8)> = lengths.iter().enumerate()
        .filter(|&(_, &length)| length != 0)
        .map(|(byte, &length)| (length, byte as u8))
        .collect();

    if let Some(&(length, _)) = symbols.iter().find(|(length, _)| *length > u32::from(MAX_CODE_LENGTH)) {
        return Err(Error::unsupported(format!("huffman code of {} bits", length)));
    }

    symbols.sort_unstable();

    let mut entries = Vec::with_capacity(symbols.len());
    let mut next_code = 0_u128;
    let mut previous_length = symbols.first().map_or(0, |&(length, _)| length);

    for (length, byte) in symbols {
        next_code <<= length - previous_length;
        previous_length = length;

        entries.push(CodeEntry {
            byte,
            code: Code { bits: next_code as u64, length: length as u8 },
        });

        next_code += 1;
    }

    entries.sort_unstable_by_key(|entry| entry.byte);
    Ok(CodeTable { entries })
}


#[cfg(test)]
mod test {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    fn round_trip(bytes: &[u8]) -> Encoded {
        let encoded = encode(bytes).unwrap();
        assert_eq!(usize_to_u64(encoded.packed.len()), (encoded.bit_count + 7) / 8);

        let decoded = decode(&encoded.packed, &encoded.table, encoded.bit_count).unwrap();
        assert_eq!(decoded.as_slice(), bytes);
        encoded
    }

    fn assert_prefix_free(table: &CodeTable) {
        for a in table.entries() {
            for b in table.entries() {
                if a.byte != b.byte {
                    assert!(!a.code.is_prefix_of(b.code), "{:?} is a prefix of {:?}", a, b);
                }
            }
        }
    }

    #[test]
    fn empty_input() {
        let encoded = round_trip(&[]);
        assert!(encoded.table.is_empty());
        assert_eq!(encoded.bit_count, 0);
    }

    #[test]
    fn single_distinct_byte() {
        let encoded = round_trip(&[7; 100]);
        assert_eq!(encoded.table.len(), 1);
        assert_eq!(encoded.table.code_of(7), Some(Code { bits: 0, length: 1 }));
        assert_eq!(encoded.bit_count, 100);
        assert_eq!(encoded.packed.len(), 13);

        round_trip(&[200]);
    }

    #[test]
    fn two_distinct_bytes() {
        let encoded = round_trip(&[1, 2, 2, 2, 1, 2]);
        assert_eq!(encoded.table.len(), 2);
        assert_eq!(encoded.bit_count, 6);
    }

    #[test]
    fn full_alphabet() {
        let bytes: Vec<u8> = (0 ..= 255_u8).cycle().take(256 * 5 + 17).collect();
        let encoded = round_trip(&bytes);
        assert_eq!(encoded.table.len(), 256);
        assert_prefix_free(&encoded.table);
    }

    #[test]
    fn random_sequences() {
        let mut random = StdRng::seed_from_u64(1);

        for size in [1_usize, 2, 3, 10, 1000, 40_000].iter().copied() {
            let skewed: Vec<u8> = (0 .. size)
                .map(|_| {
                    let value: f64 = random.random_range(0.0 .. 1.0);
                    (value * value * value * 256.0) as u8
                })
                .collect();

            let encoded = round_trip(&skewed);
            assert_prefix_free(&encoded.table);
        }
    }

    #[test]
    fn frequent_bytes_get_short_codes() {
        let mut bytes = vec![0_u8; 1000];
        bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);

        let encoded = round_trip(&bytes);
        assert_eq!(encoded.table.code_of(0).unwrap().length, 1);
        assert!(encoded.bit_count < 1100);
    }

    #[test]
    fn fibonacci_frequencies_make_long_codes() {
        let mut bytes = Vec::new();
        let (mut a, mut b) = (1_usize, 1_usize);
        for symbol in 0 .. 20_u8 {
            bytes.extend(std::iter::repeat(symbol).take(a));
            let next = a + b;
            a = b;
            b = next;
        }

        let encoded = round_trip(&bytes);
        let longest = encoded.table.entries().iter().map(|entry| entry.code.length).max().unwrap();
        assert_eq!(longest, 19);
        assert_prefix_free(&encoded.table);
    }

    #[test]
    fn code_table_is_sorted_and_deterministic() {
        let bytes = b"abracadabra, abracadabra";
        let first = encode(bytes).unwrap();
        let second = encode(bytes).unwrap();
        assert_eq!(first, second);

        let sorted = first.table.entries().windows(2).all(|pair| pair[0].byte < pair[1].byte);
        assert!(sorted);
    }

    #[test]
    fn padding_bits_are_ignored() {
        // code `0` fills the padding bits with zeroes, which must not be decoded
        let encoded = round_trip(&[9, 9, 9]);
        assert_eq!(encoded.packed, vec![0]);
        assert_eq!(encoded.bit_count, 3);
    }

    #[test]
    fn bit_count_larger_than_data() {
        let encoded = encode(b"hello world").unwrap();
        let too_many = usize_to_u64(encoded.packed.len()) * 8 + 1;
        assert!(matches!(decode(&encoded.packed, &encoded.table, too_many), Err(Error::Invalid(_))));
    }

    #[test]
    fn truncated_code() {
        let table = CodeTable::from_entries(vec![
            CodeEntry { byte: 1, code: Code { bits: 0b0, length: 1 } },
            CodeEntry { byte: 2, code: Code { bits: 0b10, length: 2 } },
            CodeEntry { byte: 3, code: Code { bits: 0b11, length: 2 } },
        ]);

        assert_eq!(decode(&[0b0101_1000], &table, 6).unwrap(), vec![1, 2, 3, 1]);
        assert!(matches!(decode(&[0b0101_1000], &table, 4), Err(Error::Invalid(_))));
    }

    #[test]
    fn incomplete_table() {
        let table = CodeTable::from_entries(vec![
            CodeEntry { byte: 1, code: Code { bits: 0b0, length: 1 } },
        ]);

        assert!(matches!(decode(&[0b1000_0000], &table, 1), Err(Error::Invalid(_))));
        assert!(matches!(decode(&[0b1000_0000], &CodeTable::default(), 1), Err(Error::Invalid(_))));
    }

    #[test]
    fn invalid_tables() {
        let entry = |byte, bits, length| CodeEntry { byte, code: Code { bits, length } };
        let invalid = |entries: Vec<CodeEntry>| {
            let table = CodeTable::from_entries(entries);
            assert!(matches!(table.validate(), Err(Error::Invalid(_))), "{:?}", table);
            assert!(decode(&[0], &table, 0).is_err());
        };

        invalid(vec![entry(1, 0b0, 1), entry(2, 0b01, 2)]); // prefix
        invalid(vec![entry(1, 0b01, 2), entry(2, 0b0, 1)]); // prefix, other order
        invalid(vec![entry(1, 0b10, 2), entry(2, 0b10, 2)]); // duplicate code
        invalid(vec![entry(1, 0b0, 1), entry(1, 0b10, 2)]); // duplicate byte
        invalid(vec![entry(1, 0b0, 0)]); // empty code
        invalid(vec![entry(1, 0b100, 2)]); // wider than length
        invalid(vec![entry(1, 0b0, 65)]); // too long

        let valid = CodeTable::from_entries(vec![entry(1, 0b0, 1), entry(2, 0b10, 2)]);
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn prefix_relation() {
        let code = |bits, length| Code { bits, length };
        assert!(code(0b1, 1).is_prefix_of(code(0b10, 2)));
        assert!(code(0b10, 2).is_prefix_of(code(0b10, 2)));
        assert!(!code(0b0, 1).is_prefix_of(code(0b10, 2)));
        assert!(!code(0b10, 2).is_prefix_of(code(0b1, 1)));
    }
}
