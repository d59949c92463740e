use practice_core::model::{OnboardingStage, ProfilePatch, User, UserId};
use practice_core::progress::Route;
use practice_core::time::fixed_now;
use services::{AppServices, Clock, Navigation, OnboardingError, PracticeConfig};
use storage::catalog::{CatalogDocument, InMemoryCatalog};

async fn services() -> AppServices {
    AppServices::in_memory(
        Clock::fixed(fixed_now()),
        InMemoryCatalog::new(CatalogDocument::default()),
        PracticeConfig::default(),
    )
    .await
}

fn learner() -> User {
    User::new(UserId::generate(), "Meera", "meera@example.com").unwrap()
}

#[tokio::test]
async fn signed_out_learner_is_sent_to_sign_in() {
    let app = services().await;
    let flow = app.onboarding();
    assert_eq!(flow.next().await.unwrap(), Navigation::SignIn);
    assert_eq!(flow.back().await.unwrap(), Navigation::SignIn);
    assert_eq!(app.progress().landing_route(), Route::SignIn);
}

#[tokio::test]
async fn stages_gate_on_profile_fields() {
    let app = services().await;
    let progress = app.progress();
    let flow = app.onboarding();
    progress.sign_in(learner()).await.unwrap();
    assert_eq!(
        progress.landing_route(),
        Route::Onboarding(OnboardingStage::Welcome)
    );

    let err = flow.next().await.unwrap_err();
    assert!(matches!(
        err,
        OnboardingError::Incomplete {
            stage: OnboardingStage::Welcome,
            ..
        }
    ));
    assert!(!flow.current().completed);

    progress
        .update_profile(ProfilePatch {
            target_exam: Some("NEET".into()),
            ..ProfilePatch::default()
        })
        .await
        .unwrap();
    assert_eq!(
        flow.next().await.unwrap(),
        Navigation::GoToStep(OnboardingStage::Subjects)
    );
    assert!(flow.next().await.is_err());

    assert_eq!(
        flow.back().await.unwrap(),
        Navigation::GoToStep(OnboardingStage::Welcome)
    );
    assert_eq!(flow.back().await.unwrap(), Navigation::Stay);
    let view = flow.current();
    assert_eq!(view.number, 1);
    assert!(view.completed);
}

#[tokio::test]
async fn completing_every_stage_lands_on_dashboard() {
    let app = services().await;
    let progress = app.progress();
    let flow = app.onboarding();
    let mut user = learner();
    user.target_exam = "NEET".into();
    user.subjects = vec!["Physics".into(), "Biology".into()];
    progress.sign_in(user).await.unwrap();

    for stage in OnboardingStage::ALL.iter().skip(1) {
        assert_eq!(flow.next().await.unwrap(), Navigation::GoToStep(*stage));
    }
    assert_eq!(flow.current().stage, OnboardingStage::Finish);
    assert_eq!(flow.next().await.unwrap(), Navigation::Dashboard);

    let state = progress.snapshot();
    assert!(state.onboarding_steps().iter().all(|s| s.completed));
    assert!(state.user().unwrap().completed_onboarding);
    assert_eq!(progress.landing_route(), Route::Dashboard);

    progress.reset_session().await.unwrap();
    assert_eq!(progress.landing_route(), Route::SignIn);
    assert!(progress.snapshot().onboarding_steps().iter().all(|s| !s.completed));
}
