use super::*;

use crate::support;

//-----------------------------------------------------------------------------

// Both containers for the same path collection.
fn build(paths: &[Vec<usize>], bidirectional: bool, interval: usize) -> (DynamicGBWT, GBWT) {
    let dynamic = DynamicGBWT::from_paths(paths, bidirectional, interval);
    let index = GBWT::from(&dynamic);
    (dynamic, index)
}

// All sequences stored in the index, in sequence order.
fn true_sequences(paths: &[Vec<usize>], bidirectional: bool) -> Vec<Vec<usize>> {
    let mut result = Vec::new();
    for path in paths.iter() {
        result.push(path.clone());
        if bidirectional {
            result.push(support::reverse_path(path));
        }
    }
    result
}

// Identifiers of the sequences containing the pattern, once per occurrence.
fn count_in_sequences(sequences: &[Vec<usize>], pattern: &[usize]) -> Vec<usize> {
    let mut result = Vec::new();
    for (id, sequence) in sequences.iter().enumerate() {
        for i in 0..sequence.len() {
            if sequence[i..].starts_with(pattern) {
                result.push(id);
            }
        }
    }
    result
}

fn check_scenario<I: PathIndex>(index: &I, paths: &[Vec<usize>], bidirectional: bool, name: &str) {
    let sequences = true_sequences(paths, bidirectional);
    assert_eq!(index.sequences(), sequences.len(), "[{}]: Invalid number of sequences", name);

    // Extraction.
    for (id, sequence) in sequences.iter().enumerate() {
        assert_eq!(&extract(index, id), sequence, "[{}]: Invalid sequence {}", name, id);
    }
    assert!(extract(index, sequences.len()).is_empty(), "[{}]: Extracted an invalid sequence", name);

    // Locate each cell of each sequence.
    for (id, sequence) in sequences.iter().enumerate() {
        let mut pos = index.start(id);
        let mut offset = 0;
        while let Some(p) = pos {
            assert_eq!(locate(index, p), Some(id), "[{}]: Invalid locate() result at offset {} of sequence {}", name, offset, id);
            pos = index.forward(p);
            offset += 1;
        }
        assert_eq!(offset, sequence.len(), "[{}]: Invalid number of cells in sequence {}", name, id);
    }

    // Find and locate all occurrences of every subpath.
    for sequence in sequences.iter() {
        for i in 0..sequence.len() {
            for j in i + 1..sequence.len() + 1 {
                let pattern = &sequence[i..j];
                let mut expected = count_in_sequences(&sequences, pattern);
                let state = find(index, pattern.iter().copied());
                if expected.is_empty() {
                    assert!(state.is_none(), "[{}]: Found occurrences for an absent pattern", name);
                    continue;
                }
                let state = state.unwrap();
                assert_eq!(state.len(), expected.len(), "[{}]: Invalid number of occurrences for pattern at {}..{}", name, i, j);
                let mut found: Vec<usize> = state.range.clone()
                    .map(|offset| locate(index, Pos::new(state.node, offset)).unwrap())
                    .collect();
                found.sort_unstable();
                expected.sort_unstable();
                assert_eq!(found, expected, "[{}]: Invalid sequence identifiers for pattern at {}..{}", name, i, j);
            }
        }
    }
}

//-----------------------------------------------------------------------------

#[test]
fn single_path() {
    let paths = vec![vec![2, 4]];
    let (dynamic, index) = build(&paths, false, DynamicGBWT::SAMPLE_INTERVAL);

    assert_eq!(index.sequences(), 1, "Invalid number of sequences");
    assert_eq!(PathIndex::start(&index, 0), Some(Pos::new(2, 0)), "Invalid start position");
    assert_eq!(extract(&index, 0), paths[0], "Invalid extracted path");

    let state = find(&index, [2, 4].iter().copied()).unwrap();
    assert_eq!(state.len(), 1, "Invalid number of occurrences");
    assert_eq!(locate(&index, Pos::new(state.node, state.range.start)), Some(0), "Invalid located sequence");

    check_scenario(&dynamic, &paths, false, "single path, dynamic");
    check_scenario(&index, &paths, false, "single path, compressed");
}

#[test]
fn duplicate_paths() {
    let paths = vec![vec![2, 4], vec![2, 4]];
    let (dynamic, index) = build(&paths, false, DynamicGBWT::SAMPLE_INTERVAL);

    assert_eq!(index.node_size(2), 2, "Invalid number of occurrences of node 2");
    let state = find(&index, [2, 4].iter().copied()).unwrap();
    assert_eq!(state.len(), 2, "Invalid number of occurrences");

    let found: Vec<usize> = state.range.clone()
        .map(|offset| locate(&index, Pos::new(state.node, offset)).unwrap())
        .collect();
    assert_eq!(found, vec![0, 1], "Invalid located sequences");

    check_scenario(&dynamic, &paths, false, "duplicate paths, dynamic");
    check_scenario(&index, &paths, false, "duplicate paths, compressed");
}

#[test]
fn branching_paths() {
    let paths = vec![vec![2, 4], vec![2, 5]];
    let (dynamic, index) = build(&paths, false, DynamicGBWT::SAMPLE_INTERVAL);

    // Both extensions of node 2 are single rows in different records.
    let state = find(&index, [2].iter().copied()).unwrap();
    assert_eq!(state.len(), 2, "Invalid number of occurrences of node 2");
    let to_4 = PathIndex::extend(&index, &state, 4).unwrap();
    assert_eq!((to_4.node, to_4.range), (4, 0..1), "Invalid extension to node 4");
    let to_5 = PathIndex::extend(&index, &state, 5).unwrap();
    assert_eq!((to_5.node, to_5.range), (5, 0..1), "Invalid extension to node 5");

    check_scenario(&dynamic, &paths, false, "branching paths, dynamic");
    check_scenario(&index, &paths, false, "branching paths, compressed");
}

#[test]
fn prefix_search() {
    let paths = vec![vec![2, 4], vec![2, 5]];
    let (dynamic, index) = build(&paths, false, DynamicGBWT::SAMPLE_INTERVAL);

    // All sequences begin with node 2.
    let state = prefix(&index, [2].iter().copied()).unwrap();
    assert_eq!(state.len(), 2, "Invalid number of sequences starting with node 2");
    let state = prefix(&dynamic, [2].iter().copied()).unwrap();
    assert_eq!(state.len(), 2, "Invalid number of sequences starting with node 2 (dynamic)");

    // An empty pattern matches the starts of all sequences.
    let state = prefix(&index, std::iter::empty()).unwrap();
    assert_eq!(state.node, ENDMARKER, "Invalid node for an empty prefix");
    assert_eq!(state.range, 0..2, "Invalid range for an empty prefix");

    // No sequence starts in the middle of a path.
    assert!(prefix(&index, [4].iter().copied()).is_none(), "Found a sequence starting with node 4");

    // Anchored and unanchored counts differ for patterns in the middle.
    assert_eq!(find(&index, [4].iter().copied()).unwrap().len(), 1, "Invalid number of occurrences of node 4");
}

#[test]
fn missing_symbols() {
    let paths = vec![vec![2, 4], vec![2, 5]];
    let (dynamic, index) = build(&paths, false, DynamicGBWT::SAMPLE_INTERVAL);

    // Node 3 has an empty record; node 1000 is outside the alphabet.
    assert!(find(&index, [3].iter().copied()).is_none(), "Found occurrences of an absent node");
    assert!(find(&index, [1000].iter().copied()).is_none(), "Found occurrences of a node outside the alphabet");
    assert!(find(&index, [2, 3].iter().copied()).is_none(), "Found occurrences of a pattern with an absent node");
    assert!(find(&dynamic, [3].iter().copied()).is_none(), "Found occurrences of an absent node (dynamic)");

    // An empty pattern has no matches.
    assert!(find(&index, std::iter::empty()).is_none(), "Found occurrences of an empty pattern");

    // Invalid locate queries.
    assert_eq!(locate(&index, Pos::new(ENDMARKER, 0)), None, "Located the endmarker");
    assert_eq!(locate(&index, Pos::new(3, 0)), None, "Located an absent node");
    assert_eq!(locate(&index, Pos::new(2, 10)), None, "Located an offset past the end of a record");
}

#[test]
fn extend_matches_find() {
    let paths = vec![
        vec![2, 4, 8, 10],
        vec![2, 4, 8, 12],
        vec![2, 6, 8, 10],
    ];
    let (_, index) = build(&paths, false, DynamicGBWT::SAMPLE_INTERVAL);

    let first = find(&index, [2, 4].iter().copied()).unwrap();
    let extended = extend(&index, &first, [8, 10].iter().copied()).unwrap();
    let direct = find(&index, [2, 4, 8, 10].iter().copied()).unwrap();
    assert_eq!(extended, direct, "Extension does not match direct search");

    // Extending an empty state yields nothing.
    let empty = SearchState {
        node: 8,
        range: 1..1,
    };
    assert!(extend(&index, &empty, [10].iter().copied()).is_none(), "Extended an empty state");
}

#[test]
fn bd_reverse_offsets() {
    let paths = vec![vec![2, 4], vec![2, 5]];
    let (_, index) = build(&paths, true, DynamicGBWT::SAMPLE_INTERVAL);

    // At node 2, the other orientations of successors 4 and 5 are 5 and 4. Extending to 5
    // shifts the reverse range by the rows whose successor sorts earlier in reverse order.
    let record = index.record(2).unwrap();
    assert_eq!(record.bd_follow(&(0..2), 4), Some((1..2, 1)), "Invalid bd_follow(0..2, 4)");
    assert_eq!(record.bd_follow(&(0..2), 5), Some((1..2, 0)), "Invalid bd_follow(0..2, 5)");

    // The same through bidirectional search: the reverse range is the forward range of the
    // reverse pattern.
    let state = index.bd_find(2).unwrap();
    let to_4 = index.extend_forward(&state, 4).unwrap();
    let reverse = find(&index, support::reverse_path(&[2, 4]).iter().copied()).unwrap();
    assert_eq!(to_4.reverse, reverse, "Invalid reverse state after extending to node 4");
}

//-----------------------------------------------------------------------------

fn example_paths() -> Vec<Vec<usize>> {
    vec![
        vec![22, 24, 28, 30, 34],
        vec![42, 44, 48, 50],
        vec![22, 24, 28, 30, 34],
        vec![22, 26, 28, 32, 34],
        vec![42, 44, 48, 47, 43],
        vec![42, 44, 48, 50],
    ]
}

#[test]
fn locate_in_both_containers() {
    let paths = example_paths();
    for interval in [1, 2, DynamicGBWT::SAMPLE_INTERVAL] {
        for bidirectional in [false, true] {
            let (dynamic, index) = build(&paths, bidirectional, interval);
            let name = format!("bidirectional {}, interval {}", bidirectional, interval);
            check_scenario(&dynamic, &paths, bidirectional, &format!("dynamic, {}", name));
            check_scenario(&index, &paths, bidirectional, &format!("compressed, {}", name));
        }
    }
}

//-----------------------------------------------------------------------------
