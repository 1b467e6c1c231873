use super::*;

//-----------------------------------------------------------------------------

// A record with unsorted outgoing edges, as they may appear mid-batch.
// The BWT slice decompresses to [5, 5, 3, 3, 3, 8, 5].
fn example_record() -> DynamicRecord {
    DynamicRecord {
        body_size: 7,
        incoming: vec![(1, 3), (2, 4)],
        outgoing: vec![(5, 2), (3, 0), (8, 1)],
        body: vec![(0, 2), (1, 3), (2, 1), (0, 1)],
        ids: vec![(2, 7), (6, 8)],
    }
}

// The successor node at each offset of the record.
fn decompressed_nodes(record: &DynamicRecord) -> Vec<usize> {
    let mut result = Vec::with_capacity(record.len());
    for run in record.body.iter() {
        for _ in 0..run.1 {
            result.push(record.successor(run.0 as usize));
        }
    }
    result
}

//-----------------------------------------------------------------------------

#[test]
fn empty_record() {
    let record = DynamicRecord::default();
    assert_eq!(record.len(), 0, "Empty record has a non-zero length");
    assert!(record.is_empty(), "Empty record is not empty");
    assert_eq!(record.runs(), 0, "Empty record contains runs");
    assert_eq!(record.indegree(), 0, "Empty record has incoming edges");
    assert_eq!(record.outdegree(), 0, "Empty record has outgoing edges");
    assert_eq!(record.samples(), 0, "Empty record contains samples");
    assert_eq!(record.node_at(0), ENDMARKER, "Invalid successor past the end");
    assert_eq!(record.lf(0), None, "Got an lf() result from an empty record");
    assert_eq!(record.lf_to(0, 3), None, "Got an lf_to() result from an empty record");
    assert_eq!(record.follow(&(0..1), 3), None, "Got a follow() result from an empty record");
}

#[test]
fn statistics() {
    let record = example_record();
    assert_eq!(record.len(), 7, "Invalid record length");
    assert!(!record.is_empty(), "Invalid emptiness");
    assert_eq!(record.runs(), 4, "Invalid number of runs");
    assert_eq!(record.indegree(), 2, "Invalid indegree");
    assert_eq!(record.outdegree(), 3, "Invalid outdegree");
    assert_eq!(record.samples(), 2, "Invalid number of samples");
}

#[test]
fn edges() {
    let record = example_record();

    let successors = [5, 3, 8];
    let offsets = [2, 0, 1];
    for outrank in 0..record.outdegree() {
        assert_eq!(record.successor(outrank), successors[outrank], "Invalid successor {}", outrank);
        assert_eq!(record.offset(outrank), offsets[outrank], "Invalid offset {}", outrank);
        assert_eq!(record.edge_to(successors[outrank]), Some(outrank), "Invalid rank for the edge to {}", successors[outrank]);
    }
    assert_eq!(record.edge_to(4), None, "Found a nonexistent edge");

    let predecessors = [1, 2];
    let counts = [3, 4];
    for inrank in 0..record.indegree() {
        assert_eq!(record.predecessor(inrank), predecessors[inrank], "Invalid predecessor {}", inrank);
        assert_eq!(record.count(inrank), counts[inrank], "Invalid count {}", inrank);
    }
}

#[test]
fn find_first_and_increment() {
    let mut record = example_record();
    assert_eq!(record.find_first(0), 0, "Invalid first rank for node 0");
    assert_eq!(record.find_first(2), 1, "Invalid first rank for node 2");
    assert_eq!(record.find_first(3), 2, "Invalid first rank past the incoming edges");

    // Increment an existing edge.
    record.increment(2);
    assert_eq!(record.indegree(), 2, "Increment created a duplicate incoming edge");
    assert_eq!(record.count(1), 5, "Increment did not update the count");

    // Create new edges at both ends and in the middle; the list must stay sorted.
    record.increment(0);
    record.increment(7);
    record.increment(2);
    assert_eq!(record.indegree(), 4, "Invalid indegree after new incoming edges");
    let expected = [(0, 1), (1, 3), (2, 6), (7, 1)];
    for inrank in 0..record.indegree() {
        assert_eq!(record.predecessor(inrank), expected[inrank].0, "Invalid predecessor {} after increments", inrank);
        assert_eq!(record.count(inrank), expected[inrank].1, "Invalid count {} after increments", inrank);
    }
}

//-----------------------------------------------------------------------------

#[test]
fn node_at() {
    let record = example_record();
    let nodes = decompressed_nodes(&record);
    for i in 0..record.len() {
        assert_eq!(record.node_at(i), nodes[i], "Invalid successor at offset {}", i);
    }
    assert_eq!(record.node_at(record.len()), ENDMARKER, "Invalid successor past the end");
}

#[test]
fn lf() {
    let record = example_record();

    // Simulate LF by counting the preceding occurrences of each successor.
    let mut edges: Vec<(usize, usize)> = record.outgoing.iter().map(|edge| (edge.0 as usize, edge.1 as usize)).collect();
    for i in 0..record.len() {
        let rank = record.body.iter().scan(0, |offset, run| {
            *offset += run.1 as usize;
            Some((run.0 as usize, *offset))
        }).find(|(_, offset)| *offset > i).unwrap().0;
        assert_eq!(record.lf(i), Some(edges[rank]), "Invalid lf({})", i);
        edges[rank].1 += 1;
    }
    assert_eq!(record.lf(record.len()), None, "Got an lf() result past the end");
}

#[test]
fn lf_to_matches_lf() {
    let record = example_record();
    for i in 0..record.len() {
        let (node, offset) = record.lf(i).unwrap();
        assert_eq!(record.lf_to(i, node), Some(offset), "lf_to({}, {}) does not match lf({})", i, node, i);
    }
    assert_eq!(record.lf_to(0, 4), None, "Got an lf_to() result for a nonexistent edge");
}

#[test]
fn follow_matches_endpoints() {
    let record = example_record();
    let len = record.len();
    for start in 0..len + 1 {
        for limit in start..len + 1 {
            for outrank in 0..record.outdegree() {
                let to = record.successor(outrank);
                let result = record.follow(&(start..limit), to);
                let expected = record.lf_to(start, to).unwrap()..record.lf_to(limit, to).unwrap();
                if expected.is_empty() {
                    assert_eq!(result, None, "Got a follow({}..{}, {}) result for an empty destination range", start, limit, to);
                } else {
                    assert_eq!(result, Some(expected), "Invalid follow({}..{}, {})", start, limit, to);
                }
            }
            assert_eq!(record.follow(&(start..limit), 4), None, "Got a follow({}..{}) result for a nonexistent edge", start, limit);
        }
    }
}

//-----------------------------------------------------------------------------

#[test]
fn recode() {
    let mut record = example_record();
    let nodes = decompressed_nodes(&record);
    record.recode();

    // The edges are now sorted and the BWT slice is unchanged.
    for outrank in 1..record.outdegree() {
        assert!(record.successor(outrank - 1) < record.successor(outrank), "Outgoing edges are not sorted after recode()");
    }
    assert_eq!(decompressed_nodes(&record), nodes, "BWT slice changed in recode()");
    assert_eq!(record.outgoing, vec![(3, 0), (5, 2), (8, 1)], "Invalid outgoing edges after recode()");

    // A second recode() is a no-op.
    let copy = record.clone();
    record.recode();
    assert_eq!(record, copy, "A second recode() changed the record");
}

#[test]
fn recode_sorted() {
    // recode() must not touch a record that is already canonical.
    let record = DynamicRecord {
        body_size: 3,
        incoming: vec![(4, 3)],
        outgoing: vec![(3, 1), (6, 0)],
        body: vec![(0, 2), (1, 1)],
        ids: vec![],
    };
    let mut copy = record.clone();
    copy.recode();
    assert_eq!(copy, record, "recode() changed a canonical record");
}

//-----------------------------------------------------------------------------
