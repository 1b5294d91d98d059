//! PlantUML diagram generation

use std::collections::HashSet;

use crate::fsm::Trigger;
use crate::HierarchicalState;

/// Generate PlantUML diagram from the state hierarchy and a transition log
pub fn generate_plantuml<S, I>(transitions: I, current_state: S) -> String
where
    S: HierarchicalState,
    I: IntoIterator<Item = (S, S, Trigger)>,
{
    let mut plantuml = String::new();
    plantuml.push_str("@startuml\n");
    plantuml.push_str("skinparam state {\n");
    plantuml.push_str("  BackgroundColor<<Current>> YellowGreen\n");
    plantuml.push_str("}\n\n");

    // Add hierarchy relationships first
    let mut seen_states: HashSet<S> = HashSet::new();
    for state in S::ALL {
        if let Some(parent) = state.parent() {
            plantuml.push_str(&format!("{:?} -up-> {:?} : parent\n", state, parent));
            seen_states.insert(*state);
            seen_states.insert(parent);
        }
    }

    // Sort so the diagram does not depend on log order
    let mut transitions: Vec<_> = transitions.into_iter().collect();
    transitions.sort_by_key(|(from, to, _)| (from.index(), to.index()));

    if !transitions.is_empty() {
        plantuml.push('\n');
    }
    for (from, to, trigger) in transitions {
        plantuml.push_str(&format!("{:?} --> {:?} : {}\n", from, to, trigger));
        seen_states.insert(from);
        seen_states.insert(to);
    }

    // Add remaining states
    for state in S::ALL {
        if !seen_states.contains(state) {
            plantuml.push_str(&format!("state {:?}\n", state));
        }
    }

    // Mark current state
    plantuml.push_str(&format!("state {:?} <<Current>>\n", current_state));

    plantuml.push_str("@enduml\n");
    plantuml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventId;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Door {
        Closed,
        Open,
        Locked,
    }

    impl HierarchicalState for Door {
        const ALL: &'static [Self] = &[Door::Closed, Door::Open, Door::Locked];

        fn index(self) -> usize {
            self as usize
        }

        fn parent(self) -> Option<Self> {
            match self {
                Door::Locked => Some(Door::Closed),
                _ => None,
            }
        }
    }

    #[test]
    fn test_diagram_contents() {
        let uml = generate_plantuml(
            vec![
                (Door::Open, Door::Closed, Trigger::Event(EventId(2))),
                (Door::Closed, Door::Open, Trigger::Event(EventId(1))),
            ],
            Door::Open,
        );

        assert!(uml.starts_with("@startuml\n"));
        assert!(uml.ends_with("@enduml\n"));
        assert!(uml.contains("Locked -up-> Closed : parent\n"));
        assert!(uml.contains("Closed --> Open : event #1\n"));
        assert!(uml.contains("Open --> Closed : event #2\n"));
        assert!(uml.contains("state Open <<Current>>\n"));

        // Sorted by source state index
        let first = uml.find("Closed --> Open").unwrap();
        let second = uml.find("Open --> Closed").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_unvisited_states_listed() {
        let uml = generate_plantuml(Vec::new(), Door::Open);
        // Open is neither in the hierarchy nor in a transition
        assert!(uml.contains("state Open\n"));
        assert!(!uml.contains("state Locked\n"));
    }
}
