use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use solder_common::{
    check_coloring, copy_costs, AffinityGraph, Coloring, Constraints, InterferenceGraph, Node,
};

use crate::{coalesce, Coalescer};

#[test]
fn already_coalesced_pair_is_left_alone() {
    let (a, b, c) = (Node(0), Node(1), Node(2));

    let mut ifg = InterferenceGraph::new();
    ifg.add_edge(a, b);
    ifg.add_edge(b, c);

    let mut aff = AffinityGraph::new();
    aff.add_affinity(a, c, 10);

    let constraints = Constraints::new(2);

    let mut initial = Coloring::new();
    initial.set(a, 0);
    initial.set(b, 1);
    initial.set(c, 0);

    let result = coalesce(&ifg, &aff, &constraints, &initial);

    assert_eq!(result, initial);
    assert_eq!(copy_costs(&aff, &result).remaining, 0);
    check_coloring(&result, &ifg, &constraints);
}

#[test]
fn recolors_to_eliminate_a_copy() {
    let (a, b, c) = (Node(0), Node(1), Node(2));

    let mut ifg = InterferenceGraph::new();
    ifg.add_edge(a, b);
    ifg.add_edge(b, c);

    let mut aff = AffinityGraph::new();
    aff.add_affinity(a, c, 10);

    let constraints = Constraints::new(2);

    let mut initial = Coloring::new();
    initial.set(a, 0);
    initial.set(b, 1);
    initial.set(c, 1);

    let result = coalesce(&ifg, &aff, &constraints, &initial);

    assert_eq!(result.get(a), 0);
    assert_eq!(result.get(b), 1);
    assert_eq!(result.get(c), 0);
    assert_eq!(copy_costs(&aff, &result).remaining, 0);
    check_coloring(&result, &ifg, &constraints);
}

#[test]
fn commits_partial_fragment_and_requeues_the_rest() {
    let (a, b, c) = (Node(0), Node(1), Node(2));

    let mut ifg = InterferenceGraph::new();
    ifg.add_node(a);
    ifg.add_node(b);
    ifg.add_node(c);

    let mut aff = AffinityGraph::new();
    aff.add_affinity(a, b, 10);
    aff.add_affinity(b, c, 9);

    // All three cluster into one chunk, but the best color for it can
    // never reach the constrained tail end.
    let mut constraints = Constraints::new(2);
    constraints.limit(c, [1]);

    let mut initial = Coloring::new();
    initial.set(a, 0);
    initial.set(b, 0);
    initial.set(c, 1);

    let result = coalesce(&ifg, &aff, &constraints, &initial);

    assert_eq!(result.get(a), 0);
    assert_eq!(result.get(b), 0);
    assert_eq!(result.get(c), 1);

    let costs = copy_costs(&aff, &result);
    assert_eq!(costs.total, 19);
    assert_eq!(costs.remaining, 9);
    check_coloring(&result, &ifg, &constraints);
}

#[test]
fn hopeless_chunk_is_dropped() {
    let (a, b) = (Node(0), Node(1));

    let mut ifg = InterferenceGraph::new();
    ifg.add_node(a);
    ifg.add_node(b);

    let mut aff = AffinityGraph::new();
    aff.add_affinity(a, b, 5);

    // With register 0 reserved only colors 0 and 1 ever get trialed, and
    // neither is admissible for these two.
    let mut constraints = Constraints::new(3);
    constraints.ignore(0);
    constraints.limit(a, [2]);
    constraints.limit(b, [2]);

    let mut initial = Coloring::new();
    initial.set(a, 2);
    initial.set(b, 2);

    let result = coalesce(&ifg, &aff, &constraints, &initial);

    assert_eq!(result, initial);
}

#[test]
fn committing_pins_displaced_neighbors() {
    let (a, b, e, g) = (Node(0), Node(1), Node(2), Node(3));

    let mut ifg = InterferenceGraph::new();
    ifg.add_edge(a, e);
    ifg.add_edge(a, g);
    ifg.add_node(b);

    let mut aff = AffinityGraph::new();
    aff.add_affinity(a, b, 10);
    aff.add_affinity(b, g, 2);

    let constraints = Constraints::new(2);

    let mut initial = Coloring::new();
    initial.set(a, 0);
    initial.set(b, 1);
    initial.set(e, 1);
    initial.set(g, 1);

    let result = coalesce(&ifg, &aff, &constraints, &initial);

    // Joining b means a takes color 1, which shoves both of its
    // interference neighbors over to 0 for good.
    assert_eq!(result.get(a), 1);
    assert_eq!(result.get(b), 1);
    assert_eq!(result.get(e), 0);
    assert_eq!(result.get(g), 0);

    assert_eq!(copy_costs(&aff, &result).remaining, 2);
    check_coloring(&result, &ifg, &constraints);
}

#[test]
fn displaced_neighbor_moves_for_a_requeued_chunk() {
    let (a, b, d, e) = (Node(0), Node(1), Node(2), Node(3));

    let mut ifg = InterferenceGraph::new();
    ifg.add_edge(b, d);
    ifg.add_edge(a, e);

    let mut aff = AffinityGraph::new();
    aff.add_affinity(a, b, 10);

    let constraints = Constraints::new(2);

    let mut initial = Coloring::new();
    initial.set(a, 0);
    initial.set(b, 1);
    initial.set(d, 0);
    initial.set(e, 1);

    let result = coalesce(&ifg, &aff, &constraints, &initial);

    assert_eq!(result.get(a), 0);
    assert_eq!(result.get(b), 0);
    assert_eq!(result.get(d), 1);
    assert_eq!(result.get(e), 1);

    assert_eq!(copy_costs(&aff, &result).remaining, 0);
    check_coloring(&result, &ifg, &constraints);
}

#[test]
fn reserved_register_stays_parked() {
    let (a, b, r) = (Node(0), Node(1), Node(2));

    let mut ifg = InterferenceGraph::new();
    ifg.add_edge(a, r);
    ifg.add_node(b);

    let mut aff = AffinityGraph::new();
    aff.add_affinity(a, b, 5);

    let mut constraints = Constraints::new(3);
    constraints.ignore(2);

    let mut initial = Coloring::new();
    initial.set(a, 0);
    initial.set(b, 1);
    initial.set(r, 2);

    let result = coalesce(&ifg, &aff, &constraints, &initial);

    assert_eq!(result.get(a), 0);
    assert_eq!(result.get(b), 0);
    assert_eq!(result.get(r), 2);
    check_coloring(&result, &ifg, &constraints);
}

#[test]
fn zero_cost_copies_change_nothing() {
    let (a, b, c) = (Node(0), Node(1), Node(2));

    let mut ifg = InterferenceGraph::new();
    ifg.add_edge(a, b);
    ifg.add_edge(b, c);

    let mut aff = AffinityGraph::new();
    aff.add_affinity(a, c, 0);
    aff.add_affinity(a, b, 0);

    let constraints = Constraints::new(2);

    let mut initial = Coloring::new();
    initial.set(a, 0);
    initial.set(b, 1);
    initial.set(c, 1);

    let result = coalesce(&ifg, &aff, &constraints, &initial);

    assert_eq!(result, initial);
}

#[test]
fn interference_clique_is_untouched() {
    let mut ifg = InterferenceGraph::new();
    let mut aff = AffinityGraph::new();
    let mut initial = Coloring::new();

    for i in 0..5 {
        initial.set(Node(i), i);

        for j in 0..i {
            ifg.add_edge(Node(j), Node(i));
            aff.add_affinity(Node(j), Node(i), 1);
        }
    }

    let constraints = Constraints::new(5);
    let result = coalesce(&ifg, &aff, &constraints, &initial);

    // Every pair wants to merge and no pair may: the coloring survives
    // exactly as it came in.
    assert_eq!(result, initial);
    check_coloring(&result, &ifg, &constraints);
}

#[test]
fn affinity_clique_gathers_one_color() {
    let mut ifg = InterferenceGraph::new();
    let mut aff = AffinityGraph::new();
    let mut initial = Coloring::new();

    for i in 0..4 {
        ifg.add_node(Node(i));
        initial.set(Node(i), i % 2);

        for j in 0..i {
            aff.add_affinity(Node(j), Node(i), 1);
        }
    }

    let constraints = Constraints::new(2);
    let result = coalesce(&ifg, &aff, &constraints, &initial);

    assert_eq!(result.get(Node(0)), 1);
    assert_eq!(result.get(Node(1)), 1);
    assert_eq!(result.get(Node(2)), 0);
    assert_eq!(result.get(Node(3)), 1);
    check_coloring(&result, &ifg, &constraints);
}

#[test]
fn chunks_partition_the_affinity_nodes() {
    let mut ifg = InterferenceGraph::new();
    let mut aff = AffinityGraph::new();
    let mut initial = Coloring::new();

    for i in 0..6 {
        ifg.add_node(Node(i));
        initial.set(Node(i), i % 2);
    }

    ifg.add_edge(Node(2), Node(3));

    aff.add_affinity(Node(0), Node(1), 4);
    aff.add_affinity(Node(1), Node(2), 4);
    aff.add_affinity(Node(2), Node(3), 4);
    aff.add_affinity(Node(3), Node(4), 4);
    aff.add_affinity(Node(4), Node(5), 4);

    let constraints = Constraints::new(2);
    let mut coalescer = Coalescer::new(&ifg, &aff, &constraints, &initial);
    coalescer.build_chunks();

    // The interference between 2 and 3 splits the chain in half, and no
    // node may appear on both sides.
    let mut seen = std::collections::BTreeSet::new();
    let chunks: Vec<_> = coalescer.chunks.ids().collect();
    assert_eq!(chunks.len(), 2);

    for chunk in chunks {
        for &node in &coalescer.chunks.get(chunk).members {
            assert!(seen.insert(node), "{node:?} is in two chunks");
        }
    }

    assert_eq!(seen.len(), 6);
}

#[test]
fn settled_neighbors_shape_color_costs() {
    let (a, partner, enemy) = (Node(0), Node(1), Node(2));

    let mut ifg = InterferenceGraph::new();
    ifg.add_node(partner);
    ifg.add_edge(a, enemy);

    let mut aff = AffinityGraph::new();
    aff.add_affinity(a, partner, 10);

    let constraints = Constraints::new(3);

    let mut initial = Coloring::new();
    initial.set(a, 0);
    initial.set(partner, 1);
    initial.set(enemy, 2);

    let mut coalescer = Coalescer::new(&ifg, &aff, &constraints, &initial);
    coalescer.nodes.get_mut(partner).fixed = true;
    coalescer.nodes.get_mut(enemy).fixed = true;

    let costs = coalescer.determine_costs(a);
    assert_eq!(costs[0].cost, 0.0);
    assert_eq!(costs[1].cost, -10.0 * 128.0);
    assert!(costs[2].cost.is_infinite());
}

#[test]
fn constrained_neighbors_penalize_their_color() {
    let (a, cramped) = (Node(0), Node(1));

    let mut ifg = InterferenceGraph::new();
    ifg.add_edge(a, cramped);

    let aff = AffinityGraph::new();

    let mut constraints = Constraints::new(3);
    constraints.limit(cramped, [1, 2]);

    let mut initial = Coloring::new();
    initial.set(a, 0);
    initial.set(cramped, 1);

    let mut coalescer = Coalescer::new(&ifg, &aff, &constraints, &initial);

    let costs = coalescer.determine_costs(a);
    assert_eq!(costs[0].cost, 0.0);
    assert_eq!(costs[1].cost, (1.0 - 2.0 / 3.0) * 64.0);
    assert_eq!(costs[2].cost, 0.0);
}

#[test]
fn random_graphs_stay_legal() {
    let mut rng = StdRng::seed_from_u64(0xC0A1E5CE);

    for _ in 0..40 {
        let n = rng.gen_range(2..14);

        let mut ifg = InterferenceGraph::new();
        for i in 0..n {
            ifg.add_node(Node(i));

            for j in 0..i {
                if rng.gen_bool(0.35) {
                    ifg.add_edge(Node(j), Node(i));
                }
            }
        }

        // Greedy seed coloring: always legal, and it bounds the class.
        let mut initial = Coloring::new();
        let mut n_regs = 1;
        for i in 0..n {
            let color = (0..)
                .find(|color| {
                    ifg.neighbors(Node(i))
                        .filter(|other| other.0 < i)
                        .all(|other| initial.get(other) != *color)
                })
                .unwrap();

            initial.set(Node(i), color);
            n_regs = n_regs.max(color + 1);
        }

        let mut aff = AffinityGraph::new();
        for i in 0..n {
            for j in 0..i {
                if rng.gen_bool(0.3) {
                    aff.add_affinity(Node(j), Node(i), rng.gen_range(0..15));
                }
            }
        }

        let constraints = Constraints::new(n_regs + rng.gen_range(0..2));

        let result = coalesce(&ifg, &aff, &constraints, &initial);
        check_coloring(&result, &ifg, &constraints);

        let again = coalesce(&ifg, &aff, &constraints, &initial);
        assert_eq!(result, again, "the pass must be deterministic");
    }
}
