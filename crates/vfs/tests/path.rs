use vfs::{FsError, PathComponent, join_path, parse_path};

#[test]
fn test_parse_path_root() {
    assert_eq!(parse_path("/").unwrap(), vec![PathComponent::Root]);
}

#[test]
fn test_parse_path_components() {
    let components = parse_path("/cpu/ctrl").unwrap();
    assert_eq!(components.len(), 3);
    assert_eq!(components[0], PathComponent::Root);
    assert_eq!(components[1], PathComponent::Normal("cpu"));
    assert_eq!(components[2], PathComponent::Normal("ctrl"));
}

#[test]
fn test_parse_path_relative_rejected() {
    assert!(matches!(parse_path("cpu"), Err(FsError::InvalidArgument)));
    assert!(matches!(parse_path(""), Err(FsError::InvalidArgument)));
}

#[test]
fn test_parse_path_empty_component_rejected() {
    assert!(matches!(parse_path("//"), Err(FsError::InvalidArgument)));
    assert!(matches!(parse_path("/cpu/"), Err(FsError::InvalidArgument)));
    assert!(matches!(parse_path("/cpu//ctrl"), Err(FsError::InvalidArgument)));
}

#[test]
fn test_parse_path_dots_are_names() {
    let components = parse_path("/./..").unwrap();
    assert_eq!(components[1], PathComponent::Normal("."));
    assert_eq!(components[2], PathComponent::Normal(".."));
}

#[test]
fn test_join_path() {
    assert_eq!(join_path("/", "cpu"), "/cpu");
    assert_eq!(join_path("/cpu", "ctrl"), "/cpu/ctrl");
}
