//! Prefix tree backend: a small Huffman style coder over the bit alphabet {0, 1}.
//!
//! The tree is built by repeatedly merging the two lightest nodes. Nodes live in an arena
//! and refer to their children by index. Because a node's arena index is also its
//! insertion order, the min-heap key (weight, index) breaks weight ties by age.
//!
//! Payload layout:
//!
//! ```text
//! preorder tree (0 = internal, then left, then right; 1 = leaf, then 8 bit symbol) | pad
//! u16 LE bit length (FF FF then u32 LE when the length is 65535 or more)
//! codewords, 0 = left and 1 = right | pad
//! ```
//!
//! A tree that is a lone leaf says every bit is that symbol, and no codewords follow.

use std::{cmp::Reverse, collections::BinaryHeap};

use log::trace;

use super::check_len;
use crate::bitstream::{bitpacker::BitPacker, bitreader::BitReader, bytereader::ByteReader};
use crate::error::{Error, Result};
use crate::tools::freq_count::bit_freqs;

/// Deepest nesting a decoded tree may have.
const MAX_DEPTH: usize = 16;
/// Short lengths are written as a u16; this value escapes to a u32.
const LONG_LENGTH: u16 = u16::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeData {
    Kids(usize, usize),
    Leaf(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    weight: usize,
    node_data: NodeData,
}

/// Arena backed code tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixTree {
    nodes: Vec<Node>,
    root: usize,
}

impl PrefixTree {
    /// Build the tree for a bit sequence with the given (zeros, ones) counts. Symbols that
    /// never occur get no leaf. With fewer than two symbols in use the tree is a lone leaf.
    pub fn from_freqs(freqs: &[usize; 2]) -> Self {
        let mut nodes = Vec::with_capacity(3);
        let mut heap = BinaryHeap::new();
        for (symbol, &weight) in freqs.iter().enumerate() {
            if weight > 0 {
                heap.push(Reverse((weight, nodes.len())));
                nodes.push(Node {
                    weight,
                    node_data: NodeData::Leaf(symbol as u8),
                });
            }
        }
        if nodes.is_empty() {
            nodes.push(Node {
                weight: 0,
                node_data: NodeData::Leaf(0),
            });
            return Self { nodes, root: 0 };
        }

        let root = loop {
            match (heap.pop(), heap.pop()) {
                (Some(Reverse((_, root))), None) => break root,
                (Some(Reverse((right_weight, right))), Some(Reverse((left_weight, left)))) => {
                    let weight = left_weight + right_weight;
                    heap.push(Reverse((weight, nodes.len())));
                    nodes.push(Node {
                        weight,
                        node_data: NodeData::Kids(left, right),
                    });
                }
                (None, _) => unreachable!("the heap always holds the partial tree"),
            }
        };
        Self { nodes, root }
    }

    /// The symbol of a lone-leaf tree.
    fn lone_symbol(&self) -> Option<u8> {
        match self.nodes[self.root].node_data {
            NodeData::Leaf(symbol) => Some(symbol),
            NodeData::Kids(..) => None,
        }
    }

    /// Codeword for each symbol, as an out24 word (length in the top byte).
    fn codes(&self) -> [Option<u32>; 2] {
        let mut table = [None; 2];
        self.assign_codes(self.root, 0, 0, &mut table);
        table
    }

    fn assign_codes(&self, idx: usize, code: u32, depth: u32, table: &mut [Option<u32>; 2]) {
        match self.nodes[idx].node_data {
            NodeData::Kids(left, right) => {
                self.assign_codes(left, code << 1, depth + 1, table);
                self.assign_codes(right, code << 1 | 1, depth + 1, table);
            }
            NodeData::Leaf(symbol) => {
                if let Some(slot) = table.get_mut(symbol as usize) {
                    *slot = Some(depth << 24 | code);
                }
            }
        }
    }

    /// Write the tree in preorder.
    fn write(&self, bp: &mut BitPacker) {
        self.write_node(self.root, bp);
    }

    fn write_node(&self, idx: usize, bp: &mut BitPacker) {
        match self.nodes[idx].node_data {
            NodeData::Kids(left, right) => {
                bp.out_bit(false);
                self.write_node(left, bp);
                self.write_node(right, bp);
            }
            NodeData::Leaf(symbol) => {
                bp.out_bit(true);
                bp.out8(symbol);
            }
        }
    }

    /// Read a preorder tree. Children are pushed before their parent, so the root is the
    /// last node in the arena.
    fn read(br: &mut BitReader<'_>) -> Result<Self> {
        let mut nodes = Vec::new();
        let root = Self::read_node(br, &mut nodes, 0)?;
        Ok(Self { nodes, root })
    }

    fn read_node(br: &mut BitReader<'_>, nodes: &mut Vec<Node>, depth: usize) -> Result<usize> {
        if depth > MAX_DEPTH {
            return Err(Error::format(format!(
                "prefix tree nests deeper than {} at {}",
                MAX_DEPTH,
                br.loc()
            )));
        }
        let leaf = br
            .bit()
            .ok_or_else(|| Error::format("prefix tree is truncated"))?;
        let node_data = if leaf {
            let symbol = br
                .byte()
                .ok_or_else(|| Error::format("prefix tree leaf is missing its symbol"))?;
            if symbol > 1 {
                return Err(Error::format(format!(
                    "prefix tree leaf holds symbol {}, expected 0 or 1",
                    symbol
                )));
            }
            NodeData::Leaf(symbol)
        } else {
            let left = Self::read_node(br, nodes, depth + 1)?;
            let right = Self::read_node(br, nodes, depth + 1)?;
            NodeData::Kids(left, right)
        };
        nodes.push(Node {
            weight: 0,
            node_data,
        });
        Ok(nodes.len() - 1)
    }
}

pub fn encode(bits: &[bool]) -> Result<Vec<u8>> {
    let tree = PrefixTree::from_freqs(&bit_freqs(bits));
    trace!(
        "Prefix tree of {} nodes, root weight {}",
        tree.nodes.len(),
        tree.nodes[tree.root].weight
    );

    let mut bp = BitPacker::new(4);
    tree.write(&mut bp);
    let mut out = bp.finish();

    match u16::try_from(bits.len()) {
        Ok(len) if len < LONG_LENGTH => out.extend_from_slice(&len.to_le_bytes()),
        _ => {
            let len = u32::try_from(bits.len()).map_err(|_| {
                Error::format(format!("{} bits do not fit a u32 length", bits.len()))
            })?;
            out.extend_from_slice(&LONG_LENGTH.to_le_bytes());
            out.extend_from_slice(&len.to_le_bytes());
        }
    }

    if tree.lone_symbol().is_none() {
        let codes = tree.codes();
        let mut bp = BitPacker::new(bits.len() / 8 + 1);
        for &bit in bits {
            let code = codes[bit as usize]
                .ok_or_else(|| Error::format(format!("no codeword for symbol {}", bit as u8)))?;
            bp.out24(code);
        }
        trace!("Codewords packed to {}", bp.loc());
        out.extend_from_slice(&bp.finish());
    }
    Ok(out)
}

pub fn decode(data: &[u8]) -> Result<Vec<bool>> {
    let mut br = BitReader::new(data);
    let tree = PrefixTree::read(&mut br)?;
    br.align();

    let mut header = ByteReader::new(data);
    header.skip(br.bytes_consumed(), "prefix tree")?;
    let len = match header.u16_le("bit length")? {
        LONG_LENGTH => header.u32_le("long bit length")? as usize,
        short => short as usize,
    };
    check_len(len)?;
    let codewords = header.rest();

    if let Some(symbol) = tree.lone_symbol() {
        if !codewords.is_empty() {
            return Err(Error::format(format!(
                "{} codeword bytes follow a single symbol tree",
                codewords.len()
            )));
        }
        return Ok(vec![symbol == 1; len]);
    }

    // Every symbol costs at least one bit
    if len > codewords.len() * 8 {
        return Err(Error::format(format!(
            "{} bits cannot come from {} codeword bytes",
            len,
            codewords.len()
        )));
    }

    let mut br = BitReader::new(codewords);
    let mut bits = Vec::with_capacity(len);
    while bits.len() < len {
        let mut idx = tree.root;
        loop {
            match tree.nodes[idx].node_data {
                NodeData::Leaf(symbol) => {
                    bits.push(symbol == 1);
                    break;
                }
                NodeData::Kids(left, right) => {
                    let bit = br.bit().ok_or_else(|| {
                        Error::format(format!(
                            "codeword stream ends after {} of {} bits",
                            bits.len(),
                            len
                        ))
                    })?;
                    idx = if bit { right } else { left };
                }
            }
        }
    }
    br.align();
    if br.remaining_bits() > 0 {
        return Err(Error::format(format!(
            "{} stray bytes after codewords",
            br.remaining_bits() / 8
        )));
    }
    Ok(bits)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn small_layout_test() {
        // freqs (1, 2): the lighter symbol 0 goes right and gets code 1
        let bits = [true, true, false];
        let encoded = encode(&bits).unwrap();
        assert_eq!(encoded, vec![0x40, 0x60, 0x00, 3, 0, 0b0010_0000]);
        assert_eq!(decode(&encoded).unwrap(), bits);
    }

    #[test]
    fn ties_go_to_insertion_order() {
        let tree = PrefixTree::from_freqs(&[4, 4]);
        // Symbol 0 was inserted first, so it is popped first and becomes the right child
        assert_eq!(tree.codes(), [Some(1 << 24 | 1), Some(1 << 24)]);
    }

    #[test]
    fn single_symbol_is_a_lone_leaf() {
        let bits = vec![true; 5000];
        let encoded = encode(&bits).unwrap();
        // 1 00000001 padded, then the length, and no codewords
        assert_eq!(encoded, vec![0b1000_0000, 0b1000_0000, 0x88, 0x13]);
        assert_eq!(decode(&encoded).unwrap(), bits);

        let encoded = encode(&[]).unwrap();
        assert_eq!(encoded, vec![0b1000_0000, 0, 0, 0]);
        assert!(decode(&encoded).unwrap().is_empty());
    }

    #[test]
    fn long_length_escape_test() {
        let bits: Vec<bool> = (0..70_000).map(|i| i % 3 == 0).collect();
        let encoded = encode(&bits).unwrap();
        // Tree: 0 1 00000000 1 00000001 -> 3 bytes, then the escape
        assert_eq!(&encoded[3..9], &[0xff, 0xff, 0x70, 0x11, 0x01, 0x00]);
        assert_eq!(decode(&encoded).unwrap(), bits);
    }

    #[test]
    fn bad_trees_are_rejected() {
        // Leaf with symbol 2
        assert!(matches!(
            decode(&[0b1000_0001, 0, 0, 0]),
            Err(Error::Format(_))
        ));
        // Nothing but internal node flags
        assert!(matches!(decode(&[0; 8]), Err(Error::Format(_))));
        assert!(decode(&[]).is_err());
    }

    #[test]
    fn bad_lengths_are_rejected() {
        let bits = [true, true, false];
        let mut encoded = encode(&bits).unwrap();
        // Claim more bits than the codewords hold
        encoded[3] = 9;
        assert!(decode(&encoded).is_err());
        // Lone leaf followed by codeword bytes
        assert!(decode(&[0b1000_0000, 0b1000_0000, 1, 0, 0]).is_err());
        // Stray byte after the codewords
        let mut encoded = encode(&bits).unwrap();
        encoded.push(0);
        assert!(decode(&encoded).is_err());
    }
}
