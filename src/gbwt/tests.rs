use super::*;

use simple_sds::serialize;

use std::iter;

//-----------------------------------------------------------------------------

fn example_paths() -> Vec<Vec<usize>> {
    vec![
        vec![1, 2, 4, 5, 7],
        vec![1, 3, 4, 5, 7],
        vec![1, 2, 4, 6, 7],
        vec![1, 2, 4, 5, 7],
        vec![2, 3, 5],
        vec![1, 3, 4, 6, 7],
    ]
}

fn build_indexes(paths: &[Vec<usize>]) -> (DynamicGBWT, GBWT) {
    let mut text: Vec<usize> = Vec::new();
    for path in paths {
        text.extend(path);
        text.push(ENDMARKER);
    }
    let mut dynamic = DynamicGBWT::default();
    dynamic.insert(&text);
    let index = GBWT::from(&dynamic);
    (dynamic, index)
}

// Checks that the compressed index agrees with the dynamic one on every query.
fn check_queries(dynamic: &DynamicGBWT, index: &GBWT) {
    assert_eq!(index.len(), dynamic.len(), "Invalid total length");
    assert_eq!(index.sequences(), dynamic.sequences(), "Invalid number of sequences");
    assert_eq!(index.alphabet_size(), dynamic.alphabet_size(), "Invalid alphabet size");
    assert_eq!(index.alphabet_offset(), dynamic.alphabet_offset(), "Invalid alphabet offset");
    assert_eq!(index.effective_size(), dynamic.effective_size(), "Invalid effective alphabet size");
    assert_eq!(index.runs(), dynamic.runs(), "Invalid number of runs");

    for node in iter::once(ENDMARKER).chain(index.first_node()..index.alphabet_size()) {
        assert_eq!(index.has_node(node), dynamic.has_node(node), "Invalid existence for node {}", node);
        let truth = dynamic.record(node).unwrap();
        let record = index.record(node);
        assert_eq!(record.is_none(), truth.is_empty(), "Invalid record existence for node {}", node);
        let record = match record {
            Some(record) => record,
            None => continue,
        };

        assert_eq!(record.len(), truth.len(), "Invalid record size for node {}", node);
        assert_eq!(record.outdegree(), truth.outdegree(), "Invalid outdegree for node {}", node);
        for outrank in 0..record.outdegree() {
            assert_eq!(record.successor(outrank), truth.successor(outrank), "Invalid successor {} for node {}", outrank, node);
            assert_eq!(record.offset(outrank), truth.offset(outrank), "Invalid offset {} for node {}", outrank, node);
        }

        for i in 0..truth.len() {
            assert_eq!(index.try_locate(node, i), dynamic.try_locate(node, i), "Invalid sample at offset {} of node {}", i, node);
        }
        for i in 0..truth.len() + 1 {
            assert_eq!(record.node_at(i), truth.node_at(i), "Invalid node at offset {} of node {}", i, node);
            assert_eq!(index.lf(node, i), dynamic.lf(node, i), "Invalid LF at offset {} of node {}", i, node);
            for outrank in 0..record.outdegree() {
                let to = record.successor(outrank);
                assert_eq!(index.lf_to(node, i, to), dynamic.lf_to(node, i, to), "Invalid LF to node {} at offset {} of node {}", to, i, node);
            }
        }

        for start in 0..truth.len() {
            for limit in start..truth.len() + 1 {
                for outrank in 0..record.outdegree() {
                    let to = record.successor(outrank);
                    assert_eq!(
                        index.follow(node, &(start..limit), to), dynamic.follow(node, &(start..limit), to),
                        "Invalid follow({}..{}, {}) at node {}", start, limit, to, node
                    );
                }
            }
        }
    }
}

//-----------------------------------------------------------------------------

#[test]
fn empty_gbwt() {
    let dynamic = DynamicGBWT::default();
    let index = GBWT::from(&dynamic);
    assert!(index.is_empty(), "The empty index is not empty");
    assert_eq!(index.sequences(), 0, "Invalid number of sequences");
    assert!(index.record(0).is_none(), "Got a record from the empty index");
    assert_eq!(index.start(0), None, "Got a starting position from the empty index");
    serialize::test(&index, "empty-gbwt", None, true);
}

#[test]
fn statistics() {
    let (_, index) = build_indexes(&example_paths());
    assert_eq!(index.len(), 34, "Invalid total length");
    assert!(!index.is_empty(), "Invalid emptiness");
    assert_eq!(index.sequences(), 6, "Invalid number of sequences");
    assert_eq!(index.alphabet_size(), 8, "Invalid alphabet size");
    assert_eq!(index.alphabet_offset(), 0, "Invalid alphabet offset");
    assert_eq!(index.effective_size(), 8, "Invalid effective alphabet size");
    assert_eq!(index.first_node(), 1, "Invalid first node");

    assert!(!index.has_node(0), "The endmarker is in the effective alphabet");
    for node in 1..8 {
        assert!(index.has_node(node), "Node {} is missing", node);
    }
    assert!(!index.has_node(8), "Found a node past the alphabet");
}

#[test]
fn queries() {
    let paths = example_paths();
    let (dynamic, index) = build_indexes(&paths);
    check_queries(&dynamic, &index);
}

#[test]
fn extract() {
    let paths = example_paths();
    let (_, index) = build_indexes(&paths);
    for (id, path) in paths.iter().enumerate() {
        let extracted: Vec<usize> = index.sequence(id).collect();
        assert_eq!(extracted, *path, "Invalid sequence {}", id);
    }
    assert!(index.sequence(paths.len()).next().is_none(), "Got nodes from a nonexistent sequence");
}

#[test]
fn navigation() {
    let paths = vec![vec![2, 3], vec![], vec![2, 4]];
    let (_, index) = build_indexes(&paths);

    // Sequence 1 is empty, so its first position is at the endmarker.
    let start = index.start(1).unwrap();
    assert_eq!(start.0, ENDMARKER, "Invalid starting node for an empty sequence");
    assert_eq!(index.forward(start), None, "An empty sequence has a next position");

    // Walk sequence 2 to its end.
    let mut pos = index.start(2);
    let mut nodes: Vec<usize> = Vec::new();
    while let Some((node, offset)) = pos {
        nodes.push(node);
        pos = index.forward((node, offset));
    }
    assert_eq!(nodes, paths[2], "Invalid positions on sequence 2");
}

#[test]
fn locate() {
    let paths = example_paths();
    let (_, index) = build_indexes(&paths);
    for id in 0..paths.len() {
        assert_eq!(index.try_locate(ENDMARKER, id), Some(id), "Invalid sample for sequence {}", id);
    }
    assert_eq!(index.try_locate(ENDMARKER, paths.len()), None, "Got a sample past the sequences");
}

//-----------------------------------------------------------------------------

#[test]
fn serialize_gbwt() {
    let (_, index) = build_indexes(&example_paths());
    serialize::test(&index, "gbwt", None, true);
}

#[test]
fn queries_after_load() {
    let (dynamic, index) = build_indexes(&example_paths());

    let filename = serialize::temp_file_name("gbwt-queries");
    serialize::serialize_to(&index, &filename).unwrap();
    let loaded: GBWT = serialize::load_from(&filename).unwrap();
    std::fs::remove_file(&filename).unwrap();

    assert_eq!(loaded, index, "The loaded index differs from the serialized one");
    check_queries(&dynamic, &loaded);
}

#[test]
fn invalid_data() {
    let (_, index) = build_indexes(&example_paths());
    let mut bytes: Vec<u8> = Vec::new();
    index.serialize(&mut bytes).unwrap();

    // Corrupt the header tag.
    bytes[0] ^= 0xFF;
    let result = GBWT::load(&mut &bytes[..]);
    assert!(result.is_err(), "Loading with a corrupted tag succeeded");

    // Truncate the data.
    let mut truncated = Vec::from(&bytes[0..bytes.len() / 2]);
    truncated[0] ^= 0xFF; // Restore the tag.
    let result = GBWT::load(&mut &truncated[..]);
    assert!(result.is_err(), "Loading truncated data succeeded");
}

//-----------------------------------------------------------------------------
