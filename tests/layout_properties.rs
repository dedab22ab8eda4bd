use orgchart_layout::layout::verify_layout;
use orgchart_layout::parser::build_from_parts;
use orgchart_layout::{
    CollapsedSet, Direction, Hierarchy, HierarchyEdge, Layout, OrderingPolicy, PersonNode, Spacing,
    VisibleSubgraph, compute_layout, resolve,
};
use proptest::prelude::*;
use proptest::sample::Index;

const DIRECTIONS: [Direction; 2] = [Direction::TopDown, Direction::LeftRight];
const ORDERINGS: [OrderingPolicy; 3] = [
    OrderingPolicy::Preserve,
    OrderingPolicy::Barycenter { passes: 4 },
    OrderingPolicy::Median { passes: 4 },
];

#[derive(Debug, Clone)]
struct Chart {
    hierarchy: Hierarchy,
    spacing: Spacing,
    collapsed: CollapsedSet,
}

/// `None` hangs the node under its predecessor, which grows deep chains;
/// `Some(index)` picks any earlier node, which grows wide fan-outs.
fn arb_parent() -> impl Strategy<Value = Option<Index>> {
    prop_oneof![Just(None), any::<Index>().prop_map(Some)]
}

fn arb_chart() -> impl Strategy<Value = Chart> {
    (1usize..60)
        .prop_flat_map(|len| {
            (
                prop::collection::vec(arb_parent(), len - 1),
                prop::collection::vec((40.0f32..260.0, 30.0f32..140.0), len),
                prop::collection::vec(any::<bool>(), len),
            )
        })
        .prop_map(|(parents, sizes, folds)| {
            let id = |idx: usize| format!("n{idx}");
            let people = (0..sizes.len())
                .map(|idx| PersonNode::new(id(idx), format!("Person {idx}")))
                .collect();
            let edges = parents
                .iter()
                .enumerate()
                .map(|(offset, parent)| {
                    let child = offset + 1;
                    let parent = parent.map_or(offset, |index| index.index(child));
                    HierarchyEdge::new(id(parent), id(child))
                })
                .collect();
            let hierarchy = build_from_parts(people, edges).expect("generated tree is valid");
            let spacing = sizes
                .iter()
                .enumerate()
                .fold(Spacing::default(), |spacing, (idx, &(width, height))| {
                    spacing.with_size(id(idx), width, height)
                });
            let collapsed = folds
                .iter()
                .enumerate()
                .filter(|(_, fold)| **fold)
                .map(|(idx, _)| id(idx))
                .collect();
            Chart {
                hierarchy,
                spacing,
                collapsed,
            }
        })
}

fn lay_out(
    visible: &VisibleSubgraph,
    direction: Direction,
    spacing: &Spacing,
    ordering: OrderingPolicy,
) -> Result<Layout, TestCaseError> {
    compute_layout(visible, direction, spacing, ordering)
        .map_err(|err| TestCaseError::fail(format!("{direction:?}/{ordering:?}: {err}")))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_visible_node_is_placed_without_overlap(chart in arb_chart()) {
        for collapsed in [CollapsedSet::new(), chart.collapsed.clone()] {
            let visible = resolve(&chart.hierarchy, &collapsed);
            for direction in DIRECTIONS {
                for ordering in ORDERINGS {
                    let layout = lay_out(&visible, direction, &chart.spacing, ordering)?;
                    prop_assert!(verify_layout(&visible, &layout).is_ok());
                    prop_assert_eq!(layout.nodes.len(), visible.len());
                    for id in &visible.nodes {
                        prop_assert!(layout.nodes.contains_key(id), "`{}` not placed", id);
                    }
                    for edge in &visible.edges {
                        prop_assert_eq!(
                            layout.rank_of(&edge.child),
                            layout.rank_of(&edge.parent).map(|rank| rank + 1)
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn repeated_runs_give_identical_layouts(chart in arb_chart()) {
        let first = resolve(&chart.hierarchy, &chart.collapsed);
        let second = resolve(&chart.hierarchy, &chart.collapsed);
        prop_assert_eq!(&first, &second);
        for direction in DIRECTIONS {
            for ordering in ORDERINGS {
                let a = lay_out(&first, direction, &chart.spacing, ordering)?;
                let b = lay_out(&second, direction, &chart.spacing, ordering)?;
                prop_assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn collapse_then_expand_round_trips(chart in arb_chart(), pick in any::<Index>()) {
        let hierarchy = &chart.hierarchy;
        let ids: Vec<&str> = hierarchy.ids().collect();
        let target = ids[pick.index(ids.len())].to_string();
        let full = resolve(hierarchy, &CollapsedSet::new());

        let mut collapsed = CollapsedSet::new();
        collapsed.insert(target.clone());
        let folded = resolve(hierarchy, &collapsed);
        let removed: Vec<String> = full.nodes.iter().filter(|id| !folded.contains(id)).cloned().collect();
        prop_assert_eq!(removed, hierarchy.descendants(&target));
        prop_assert!(folded.contains(&target));

        collapsed.remove(&target);
        prop_assert_eq!(&resolve(hierarchy, &collapsed), &full);

        // Expanding a random collapsed set one id at a time lands on the full chart.
        let mut collapsed = chart.collapsed.clone();
        while let Some(id) = collapsed.pop_first() {
            let visible = resolve(hierarchy, &collapsed);
            let layout = lay_out(&visible, Direction::TopDown, &chart.spacing, OrderingPolicy::Preserve)?;
            prop_assert!(verify_layout(&visible, &layout).is_ok(), "after expanding `{}`", id);
        }
        prop_assert_eq!(&resolve(hierarchy, &collapsed), &full);
    }
}
