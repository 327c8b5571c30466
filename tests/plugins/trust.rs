use covenant::plugins::trust::{apply_failure, apply_success};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn seed_agent_trajectory_through_three_completions() {
    // 0.50 -> 0.55 -> 0.60 -> 0.65. The third completion reaches streak
    // three but trust already sits at the momentum ceiling, so no bonus.
    let (score, streak) = apply_success(0.5, 0);
    assert!(close(score, 0.55));
    let (score, streak) = apply_success(score, streak);
    assert!(close(score, 0.60));
    let (score, streak) = apply_success(score, streak);
    assert!(close(score, 0.65));
    assert_eq!(streak, 3);
}

#[test]
fn struggling_agent_earns_momentum_on_a_streak() {
    // Start low enough that the third completion still sits below the
    // ceiling: 0.40 -> 0.45 -> 0.50 -> 0.57 (bonus) -> 0.64 (bonus).
    let (score, streak) = apply_success(0.40, 0);
    let (score, streak) = apply_success(score, streak);
    let (score, streak) = apply_success(score, streak);
    assert!(close(score, 0.57));
    assert_eq!(streak, 3);
    let (score, _) = apply_success(score, streak);
    assert!(close(score, 0.64));
}

#[test]
fn one_failure_erases_the_streak_not_the_score_floor() {
    let (score, streak) = apply_success(0.55, 2);
    assert_eq!(streak, 3);
    let (score, streak) = apply_failure(score);
    assert_eq!(streak, 0);
    assert!(close(score, 0.52));
    // The next success starts a fresh streak with no bonus.
    let (score, streak) = apply_success(score, streak);
    assert_eq!(streak, 1);
    assert!(close(score, 0.57));
}

#[test]
fn long_success_runs_saturate_at_one() {
    let mut score = 0.5;
    let mut streak = 0;
    for _ in 0..30 {
        let (s, k) = apply_success(score, streak);
        score = s;
        streak = k;
        assert!(score <= 1.0);
    }
    assert!(close(score, 1.0));
    assert_eq!(streak, 30);
}

#[test]
fn repeated_failures_saturate_at_zero() {
    let mut score = 0.95;
    for _ in 0..12 {
        let (s, _) = apply_failure(score);
        score = s;
        assert!(score >= 0.0);
    }
    assert!(close(score, 0.0));
}

#[test]
fn betrayal_boundary_is_exclusive_at_the_floor() {
    let (above, _) = apply_failure(0.91);
    assert!(close(above, 0.71));
    let (at, _) = apply_failure(0.90);
    assert!(close(at, 0.80));
}
