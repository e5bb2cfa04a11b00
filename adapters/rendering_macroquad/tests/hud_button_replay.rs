use tint_tap_rendering_macroquad::HudInputState;

fn run_commit_sequence(sequence: &[bool]) -> Vec<bool> {
    let mut state = HudInputState::default();
    let mut commits = Vec::new();
    for &pressed in sequence {
        commits.push(state.take_commit());
        if pressed {
            state.register_commit();
        }
    }

    // Flush any trailing latched press so the harness observes the final commit.
    commits.push(state.take_commit());
    commits
}

#[test]
fn submit_button_sequence_is_deterministic() {
    let button_sequence = [false, true, false, true, true, false];
    let expected = vec![false, false, true, false, true, true, false];

    let first_run = run_commit_sequence(&button_sequence);
    let second_run = run_commit_sequence(&button_sequence);

    assert_eq!(first_run, expected);
    assert_eq!(first_run, second_run);
}

#[test]
fn restart_latch_is_independent_of_commit() {
    let mut state = HudInputState::default();
    state.register_restart();

    assert!(!state.take_commit());
    assert!(state.take_restart());
    assert!(!state.take_restart());
}
