use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        WallError::config("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(
        WallError::transport("x")
            .to_string()
            .contains("transport error:")
    );
    assert!(
        WallError::connection_dropped("x")
            .to_string()
            .contains("connection dropped:")
    );
    assert!(WallError::codec("x").to_string().contains("codec error:"));
    assert!(
        WallError::protocol("x")
            .to_string()
            .contains("protocol error:")
    );
    assert!(
        WallError::validation("x")
            .to_string()
            .contains("validation error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = WallError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn eof_maps_to_connection_dropped() {
    let eof = std::io::Error::from(std::io::ErrorKind::UnexpectedEof);
    assert!(matches!(
        WallError::from_io("read", eof),
        WallError::ConnectionDropped(_)
    ));

    let other = std::io::Error::other("nope");
    assert!(matches!(
        WallError::from_io("read", other),
        WallError::Transport(_)
    ));
}
