use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        LessonError::unknown_scene(SceneId(3), "not in lesson")
            .to_string()
            .contains("unknown scene s3:")
    );
    assert!(
        LessonError::invalid_transition(SceneId(1), "x")
            .to_string()
            .contains("invalid transition on scene s1:")
    );
    assert!(
        LessonError::invalid_value("x")
            .to_string()
            .contains("invalid value:")
    );
    assert!(
        LessonError::persist("x")
            .to_string()
            .contains("persistence error:")
    );
    assert_eq!(
        LessonError::DuplicateLanguage("fr".to_string()).to_string(),
        "language 'fr' is already enabled"
    );
}

#[test]
fn unknown_object_names_both_ids() {
    let err = LessonError::UnknownObject {
        scene: SceneId(2),
        object: ObjectId(9),
    };
    assert_eq!(err.to_string(), "unknown object o9 in scene s2");
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = LessonError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
