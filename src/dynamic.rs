//! The dynamic GBWT: a mutable index supporting incremental insertion.

use crate::{ENDMARKER, SAMPLE_INTERVAL};
use crate::gbwt::GBWT;
use crate::headers::{Header, GBWTPayload};
use crate::record::{DynamicRecord, RecordInt};
use crate::support;

use rayon::prelude::*;

use std::cmp;
use std::mem;
use std::ops::Range;


//-----------------------------------------------------------------------------

/// A mutable GBWT index.
///
/// The index owns a vector of mutable node records and supports batched
/// insertion of new sequences. Queries are available at any time, but the
/// compressed [`GBWT`] form is smaller and faster for them. The dynamic index
/// is not reentrant: insertion requires exclusive access for the duration of
/// a batch.
///
/// New sequences receive identifiers starting from
/// [`DynamicGBWT::sequences`], in the order they appear in the input.
///
/// # Examples
///
/// ```
/// use gbwt_dynamic::{DynamicGBWT, ENDMARKER};
///
/// let mut index = DynamicGBWT::default();
/// index.insert(&[3, 5, 0, 3, 7, 0]);
///
/// assert_eq!(index.sequences(), 2);
/// assert_eq!(index.len(), 6);
/// assert!(index.has_node(5));
///
/// // Walk the second sequence from its row in the endmarker record.
/// assert_eq!(index.lf(ENDMARKER, 1), Some((3, 1)));
/// assert_eq!(index.lf(3, 1), Some((7, 0)));
/// assert_eq!(index.lf(7, 0), Some((0, 1)));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DynamicGBWT {
    header: Header<GBWTPayload>,
    bwt: Vec<DynamicRecord>,
}

//-----------------------------------------------------------------------------

/// Index statistics.
impl DynamicGBWT {
    /// Returns the total length of the sequences in the index, including the endmarkers.
    #[inline]
    pub fn len(&self) -> usize {
        self.header.payload().size
    }

    /// Returns `true` if the index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of sequences in the index.
    #[inline]
    pub fn sequences(&self) -> usize {
        self.header.payload().sequences
    }

    /// Returns the size of the alphabet.
    #[inline]
    pub fn alphabet_size(&self) -> usize {
        self.header.payload().alphabet_size
    }

    /// Returns the alphabet offset for the effective alphabet.
    #[inline]
    pub fn alphabet_offset(&self) -> usize {
        self.header.payload().offset
    }

    /// Returns the size of the effective alphabet, including the endmarker.
    #[inline]
    pub fn effective_size(&self) -> usize {
        self.alphabet_size() - self.alphabet_offset()
    }

    /// Returns `true` if node identifier `id` is in the effective alphabet.
    #[inline]
    pub fn has_node(&self, id: usize) -> bool {
        id > self.alphabet_offset() && id < self.alphabet_size()
    }

    /// Returns `true` if the index has a record for the given node.
    ///
    /// This is the precondition for all queries; it holds for the endmarker
    /// and for the effective alphabet.
    #[inline]
    pub fn contains(&self, node: usize) -> bool {
        node == ENDMARKER || self.has_node(node)
    }

    /// Returns the total number of runs in the records.
    pub fn runs(&self) -> usize {
        self.bwt.iter().map(|record| record.runs()).sum()
    }

    /// Returns the total number of samples in the records.
    pub fn samples(&self) -> usize {
        self.bwt.iter().map(|record| record.samples()).sum()
    }

    // Converts node id to record id.
    #[inline]
    fn to_comp(&self, node: usize) -> usize {
        if node == ENDMARKER { 0 } else { node - self.alphabet_offset() }
    }

    // The header for building the compressed index.
    pub(crate) fn header(&self) -> &Header<GBWTPayload> {
        &self.header
    }

    // The records for building the compressed index.
    pub(crate) fn records(&self) -> &[DynamicRecord] {
        &self.bwt
    }
}

//-----------------------------------------------------------------------------

/// Queries.
impl DynamicGBWT {
    /// Returns the record for the given node, or [`None`] if the node is not
    /// the endmarker or in the effective alphabet.
    pub fn record(&self, node: usize) -> Option<&DynamicRecord> {
        if !self.contains(node) {
            return None;
        }
        self.bwt.get(self.to_comp(node))
    }

    /// Follows the sequence at offset `i` of node `node` and returns
    /// (successor node, offset in successor), or [`None`] if the position does
    /// not exist.
    ///
    /// The successor may be the endmarker; see [`DynamicRecord::lf`].
    pub fn lf(&self, node: usize, i: usize) -> Option<(usize, usize)> {
        self.record(node)?.lf(i)
    }

    /// Returns the offset in node `to` that offset `i` of node `node` maps to
    /// under LF, or [`None`] if there is no edge between the nodes.
    pub fn lf_to(&self, node: usize, i: usize, to: usize) -> Option<usize> {
        self.record(node)?.lf_to(i, to)
    }

    /// Follows all sequences in the offset range of node `node` to node `to`.
    ///
    /// Returns a semiopen offset range in the destination node; see
    /// [`DynamicRecord::follow`].
    pub fn follow(&self, node: usize, range: &Range<usize>, to: usize) -> Option<Range<usize>> {
        self.record(node)?.follow(range, to)
    }

    /// Returns the sampled sequence identifier at offset `i` of node `node`,
    /// or [`None`] if the position does not carry a sample.
    pub fn try_locate(&self, node: usize, i: usize) -> Option<usize> {
        let record = self.record(node)?;
        match record.ids.binary_search_by_key(&(i as RecordInt), |sample| sample.0) {
            Ok(index) => Some(record.ids[index].1 as usize),
            Err(_) => None,
        }
    }
}

//-----------------------------------------------------------------------------

// A sequence being inserted into the index.
//
// The derived order sorts the sequences by (current node, offset in the
// record of that node), which is the order the rows are inserted in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Sequence {
    // The node whose record the next row goes into.
    curr: usize,
    // Offset of the row in the record of `curr`, counting the rows inserted
    // by the other sequences of the same round.
    offset: usize,
    // Sequence identifier in the index.
    id: usize,
    // The node to write at the insertion point.
    next: usize,
    // Offset of `next` in the text.
    pos: usize,
    // Offset where the sequence starts in the text.
    start: usize,
}

//-----------------------------------------------------------------------------

/// Insertion.
impl DynamicGBWT {
    /// Inserts the sequences in the text into the index.
    ///
    /// The text must be a concatenation of sequences, each of which ends with
    /// an endmarker (`0`). The new sequences receive identifiers starting from
    /// [`DynamicGBWT::sequences`]. Does nothing if the text is empty.
    ///
    /// # Panics
    ///
    /// Panics if the text does not end with an endmarker.
    pub fn insert(&mut self, text: &[usize]) {
        if text.is_empty() {
            return;
        }
        assert_eq!(*text.last().unwrap(), ENDMARKER, "DynamicGBWT: The text must end with an endmarker");
        self.insert_batch(text);
    }

    /// Inserts the sequences in the text into the index in batches of at least
    /// `batch_size` nodes.
    ///
    /// Batches always end at sequence boundaries. Batch size `0` inserts the
    /// entire text at once; [`crate::INSERT_BATCH_SIZE`] is a reasonable
    /// default for large inputs. See [`DynamicGBWT::insert`].
    pub fn insert_batched(&mut self, text: &[usize], batch_size: usize) {
        if text.is_empty() {
            return;
        }
        assert_eq!(*text.last().unwrap(), ENDMARKER, "DynamicGBWT: The text must end with an endmarker");
        if batch_size == 0 {
            self.insert_batch(text);
            return;
        }
        let mut start = 0;
        while start < text.len() {
            let mut limit = cmp::min(start + batch_size, text.len());
            while text[limit - 1] != ENDMARKER {
                limit += 1;
            }
            self.insert_batch(&text[start..limit]);
            start = limit;
        }
    }

    /// Inserts the sequences from the compressed index into this index, in
    /// batches of `batch_size` sequences.
    ///
    /// The sequences are extracted in the order of their identifiers and
    /// receive new identifiers starting from [`DynamicGBWT::sequences`].
    /// Batch size `0` inserts all sequences at once;
    /// [`crate::MERGE_BATCH_SIZE`] is a reasonable default. The node
    /// identifier spaces may overlap; the effective alphabets are unioned.
    pub fn merge(&mut self, source: &GBWT, batch_size: usize) {
        let batch_size = if batch_size == 0 { cmp::max(source.sequences(), 1) } else { batch_size };
        let mut text: Vec<usize> = Vec::new();
        let mut in_batch = 0;
        for id in 0..source.sequences() {
            text.extend(source.sequence(id));
            text.push(ENDMARKER);
            in_batch += 1;
            if in_batch >= batch_size {
                self.insert_batch(&text);
                text.clear();
                in_batch = 0;
            }
        }
        if !text.is_empty() {
            self.insert_batch(&text);
        }
    }
}

//-----------------------------------------------------------------------------

// The insertion algorithm. Each batch extends the BWT-incremental
// construction to all sequences at once: every sequence starts at its row in
// the endmarker record, and each round inserts the next node of every
// remaining sequence, processing the sequences in the order of their current
// records.
impl DynamicGBWT {
    fn insert_batch(&mut self, text: &[usize]) {
        if text.is_empty() {
            return;
        }

        // Create a sequence for each endmarker-terminated run in the text and
        // determine the alphabet. A sequence starts at its own row of the
        // endmarker record, after all previously inserted sequences.
        let mut seqs: Vec<Sequence> = Vec::new();
        let mut min_node = usize::MAX;
        let mut max_node = 0;
        let mut seq_start = true;
        for (i, &node) in text.iter().enumerate() {
            if seq_start {
                let id = self.sequences();
                seqs.push(Sequence {
                    curr: ENDMARKER,
                    offset: id,
                    id,
                    next: node,
                    pos: i,
                    start: i,
                });
                self.header.payload_mut().sequences += 1;
                seq_start = false;
            }
            if node == ENDMARKER {
                seq_start = true;
            } else {
                min_node = cmp::min(min_node, node);
                max_node = cmp::max(max_node, node);
            }
        }
        self.header.payload_mut().size += text.len();

        // Make room for the new records. A batch of empty sequences only
        // needs the endmarker record.
        if max_node == ENDMARKER {
            self.resize(self.alphabet_offset(), cmp::max(self.alphabet_size(), 1));
        } else {
            self.resize(min_node - 1, max_node + 1);
        }

        // Insert one node of every remaining sequence per round. A sequence is
        // finished once its endmarker has been written.
        while !seqs.is_empty() {
            self.update_records(&seqs);
            self.rebuild_offsets(&seqs);
            self.advance(&mut seqs, text);
        }

        self.recode();
    }

    // Inserts the next row of each sequence into the record of its current
    // node, updates the incoming counts at the destinations, and takes the
    // samples. The sequences are sorted by (current node, offset).
    fn update_records(&mut self, seqs: &[Sequence]) {
        let mut i = 0;
        while i < seqs.len() {
            let curr = seqs[i].curr;
            let mut limit = i;
            while limit < seqs.len() && seqs[limit].curr == curr {
                limit += 1;
            }
            let comp = self.to_comp(curr);
            Self::insert_rows(&mut self.bwt[comp], &seqs[i..limit]);
            for seq in seqs[i..limit].iter() {
                let next_comp = self.to_comp(seq.next);
                self.bwt[next_comp].increment(curr);
            }
            i = limit;
        }
    }

    // Inserts the rows for the sequences into the record. All sequences are at
    // the same node, sorted by the target offset, and the offsets account for
    // the rows inserted by the other sequences of the round.
    fn insert_rows(record: &mut DynamicRecord, seqs: &[Sequence]) {
        fn push_run(body: &mut Vec<(RecordInt, RecordInt)>, run: (RecordInt, RecordInt)) {
            if let Some(last) = body.last_mut() {
                if last.0 == run.0 {
                    last.1 += run.1;
                    return;
                }
            }
            body.push(run);
        }

        let mut new_body: Vec<(RecordInt, RecordInt)> = Vec::with_capacity(record.body.len() + seqs.len());
        let mut new_ids: Vec<(RecordInt, RecordInt)> = Vec::with_capacity(record.ids.len() + seqs.len());
        let mut old_runs = mem::take(&mut record.body).into_iter();
        let mut old_ids = mem::take(&mut record.ids).into_iter().peekable();
        let mut pending = old_runs.next();
        let mut covered = 0; // Rows in the new body.
        let mut inserted = 0; // New rows in the new body.

        for seq in seqs {
            // Copy the old runs preceding the insertion offset, splitting the
            // last one if necessary.
            let mut take = seq.offset - covered;
            while take > 0 {
                let (rank, len) = pending.unwrap();
                if (len as usize) <= take {
                    push_run(&mut new_body, (rank, len));
                    covered += len as usize;
                    take -= len as usize;
                    pending = old_runs.next();
                } else {
                    push_run(&mut new_body, (rank, take as RecordInt));
                    pending = Some((rank, len - take as RecordInt));
                    covered += take;
                    take = 0;
                }
            }

            // Shift the old samples preceding the insertion offset.
            while let Some(&(pos, id)) = old_ids.peek() {
                if (pos as usize) + inserted < seq.offset {
                    new_ids.push((pos + inserted as RecordInt, id));
                    old_ids.next();
                } else {
                    break;
                }
            }

            // The new row. A missing edge is appended to the outgoing list;
            // its offset is rebuilt at the end of the round.
            let outrank = match record.edge_to(seq.next) {
                Some(outrank) => outrank,
                None => {
                    record.outgoing.push((seq.next as RecordInt, 0));
                    record.outdegree() - 1
                }
            };
            push_run(&mut new_body, (outrank as RecordInt, 1));
            covered += 1;
            inserted += 1;

            // Sample the row at every SAMPLE_INTERVAL-th position of the
            // sequence and at the endmarker.
            if (seq.pos - seq.start) % SAMPLE_INTERVAL == 0 || seq.next == ENDMARKER {
                new_ids.push((seq.offset as RecordInt, seq.id as RecordInt));
            }
        }

        // The rest of the old runs and samples.
        if let Some(run) = pending {
            push_run(&mut new_body, run);
        }
        new_body.extend(old_runs);
        for (pos, id) in old_ids {
            new_ids.push((pos + inserted as RecordInt, id));
        }

        record.body = new_body;
        record.ids = new_ids;
        record.body_size += seqs.len();
    }

    // Rebuilds the offsets of the outgoing edges into every node that
    // received new traversals: the offset of edge (v, w) is the prefix sum of
    // the incoming counts of w over predecessors smaller than v.
    fn rebuild_offsets(&mut self, seqs: &[Sequence]) {
        let mut nodes: Vec<usize> = seqs.iter().map(|seq| seq.next).collect();
        nodes.sort_unstable();
        nodes.dedup();
        for node in nodes {
            let comp = self.to_comp(node);
            let incoming = self.bwt[comp].incoming.clone();
            let mut offset = 0;
            for edge in incoming {
                let pred_comp = self.to_comp(edge.0 as usize);
                let outrank = self.bwt[pred_comp].edge_to(node).unwrap();
                self.bwt[pred_comp].outgoing[outrank].1 = offset as RecordInt;
                offset += edge.1 as usize;
            }
        }
    }

    // Removes the finished sequences and moves the rest one step forward,
    // computing the new offsets with LF in the updated records.
    fn advance(&mut self, seqs: &mut Vec<Sequence>, text: &[usize]) {
        seqs.retain(|seq| seq.next != ENDMARKER);
        for seq in seqs.iter_mut() {
            let record = &self.bwt[self.to_comp(seq.curr)];
            seq.offset = record.lf_to(seq.offset, seq.next).unwrap();
            seq.curr = seq.next;
            seq.pos += 1;
            seq.next = text[seq.pos];
        }
        support::choose_sort(seqs);
    }

    // Grows the effective alphabet to cover the given offset and alphabet
    // size. The offset can decrease at any time; it can grow only while the
    // index has no effective records.
    fn resize(&mut self, new_offset: usize, new_sigma: usize) {
        if new_offset < self.alphabet_offset() {
            let diff = self.alphabet_offset() - new_offset;
            if self.bwt.len() > 1 {
                // Shift the records so that the comp values remain valid.
                let tail = self.bwt.split_off(1);
                self.bwt.resize(1 + diff, DynamicRecord::default());
                self.bwt.extend(tail);
            }
            self.header.payload_mut().offset = new_offset;
        } else if new_offset > self.alphabet_offset() && self.bwt.len() <= 1 {
            self.header.payload_mut().offset = new_offset;
        }
        if new_sigma > self.alphabet_size() {
            self.header.payload_mut().alphabet_size = new_sigma;
        }
        let effective = self.effective_size();
        if self.bwt.len() < effective {
            self.bwt.resize(effective, DynamicRecord::default());
        }
    }

    // Sorts the outgoing edges and rewrites the outranks in the runs
    // accordingly. Serialization requires sorted edges, as the identifiers of
    // the destination nodes are gap-encoded.
    fn recode(&mut self) {
        if self.bwt.len() >= support::PARALLEL_SORT_THRESHOLD {
            self.bwt.par_iter_mut().for_each(|record| record.recode());
        } else {
            for record in self.bwt.iter_mut() {
                record.recode();
            }
        }
    }
}

//-----------------------------------------------------------------------------

impl From<&GBWT> for DynamicGBWT {
    fn from(source: &GBWT) -> Self {
        let mut header = Header::<GBWTPayload>::new();
        {
            let payload = header.payload_mut();
            payload.sequences = source.sequences();
            payload.size = source.len();
            payload.offset = source.alphabet_offset();
            payload.alphabet_size = source.alphabet_size();
        }

        // Decompress the record bodies and outgoing edges.
        let mut bwt: Vec<DynamicRecord> = vec![DynamicRecord::default(); source.effective_size()];
        for record in source.as_ref().iter() {
            let dynamic = &mut bwt[record.id()];
            dynamic.outgoing = (0..record.outdegree())
                .map(|outrank| (record.successor(outrank) as RecordInt, record.offset(outrank) as RecordInt))
                .collect();
            for (outrank, len) in record.run_iter() {
                dynamic.body.push((outrank as RecordInt, len as RecordInt));
                dynamic.body_size += len;
            }
        }

        // Rebuild the incoming edges by counting the traversals of each edge.
        for comp in 0..bwt.len() {
            if bwt[comp].is_empty() {
                continue;
            }
            let node = if comp == 0 { ENDMARKER } else { comp + source.alphabet_offset() };
            let mut counts: Vec<usize> = vec![0; bwt[comp].outdegree()];
            for run in bwt[comp].body.iter() {
                counts[run.0 as usize] += run.1 as usize;
            }
            for (outrank, count) in counts.into_iter().enumerate() {
                let successor = bwt[comp].successor(outrank);
                let succ_comp = if successor == ENDMARKER { 0 } else { successor - source.alphabet_offset() };
                bwt[succ_comp].incoming.push((node as RecordInt, count as RecordInt));
            }
        }
        for record in bwt.iter_mut() {
            record.incoming.sort_unstable();
        }

        // Restore the samples.
        for (comp, offset, id) in source.samples().extract() {
            bwt[comp].ids.push((offset as RecordInt, id as RecordInt));
        }

        DynamicGBWT {
            header,
            bwt,
        }
    }
}

//-----------------------------------------------------------------------------
