use super::*;

#[test]
fn base_layer() {
    let km = &DEFAULT_KEYMAP;

    assert_eq!(km.action(0, 0), KeyAction::Single(MouseButton(mouse_button::LEFT)));
    assert_eq!(
        km.action(0, 2),
        KeyAction::TapHold {
            tap: Action::Key {
                code: usage::UP,
                modifiers: modifier::LCTL
            },
            hold: Layer(NAV),
            term_ms: DEFAULT_TERM,
        }
    );
    assert_eq!(km.action(0, 3), KeyAction::Single(MouseButton(mouse_button::RIGHT)));
}

#[test]
fn nav_layer_falls_through_transparent() {
    let km = &DEFAULT_KEYMAP;
    let mask = 1 << NAV;

    assert_eq!(km.action(mask, 0), KeyAction::Single(MouseButton(mouse_button::MIDDLE)));
    assert_eq!(km.action(mask, 1), KeyAction::Single(DragScrollToggle));
    assert_eq!(km.action(mask, 2), km.action(0, 2));
    assert!(matches!(
        km.action(mask, 4),
        KeyAction::TapHold {
            hold: Bootloader,
            term_ms: 1000,
            ..
        }
    ));
}

#[test]
fn out_of_range() {
    let km = &DEFAULT_KEYMAP;
    assert_eq!(km.action(0, BUTTON_COUNT), KeyAction::Single(Action::None));
    assert_eq!(km.action(0x80, 0), km.action(0, 0));
}

#[test]
fn all_transparent() {
    let km = Keymap::<1, 2>::new([
        [KeyAction::Single(Transparent)],
        [KeyAction::Single(Transparent)],
    ]);
    assert_eq!(km.action(3, 0), KeyAction::Single(Action::None));
}
