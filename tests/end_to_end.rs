// tests/end_to_end.rs

use puzzle_frontend::fonts::FontFamily;
use puzzle_frontend::keys::{KeySymbol, Modifiers};
use puzzle_frontend::platform::backends::headless::HeadlessDriver;
use puzzle_frontend::platform::{ButtonEvent, MenuAction, PixelRect, PlatformEvent};
use puzzle_frontend::render::Align;
use puzzle_frontend::testcard::TestCard;
use puzzle_frontend::{Command, Config, DrawingApi, Frontend, FrontendError, FrontendStatus, Midend};

/// Draws nothing on redraw; `d` draws one filled rectangle.
struct OneRect {
    primitives: Vec<(i32, i32, i32, i32)>,
}

impl Midend for OneRect {
    type Params = ();

    fn new_game(&mut self, _saved: Option<&str>) {}

    fn size(&self) -> (i32, i32) {
        (400, 400)
    }

    fn num_presets(&self) -> usize {
        0
    }

    fn fetch_preset(&self, _index: usize) -> Option<(String, ())> {
        None
    }

    fn colours(&mut self, _fe: &dyn DrawingApi) -> Vec<f32> {
        vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]
    }

    fn wants_statusbar(&self) -> bool {
        false
    }

    fn process_key(&mut self, fe: &mut dyn DrawingApi, _x: i32, _y: i32, command: Command) -> bool {
        match command {
            Command::Char(b'd') => {
                fe.start_draw();
                for &(x, y, w, h) in &self.primitives {
                    fe.draw_rect(x, y, w, h, 1);
                }
                fe.end_draw();
                true
            }
            Command::Char(b'e') => {
                fe.start_draw();
                fe.end_draw();
                true
            }
            Command::Char(b'q') => false,
            _ => true,
        }
    }

    fn timer(&mut self, _fe: &mut dyn DrawingApi, _elapsed: f32) {}

    fn redraw(&mut self, _fe: &mut dyn DrawingApi) {}

    fn params(&self) {}

    fn set_params(&mut self, _params: &()) {}
}

fn type_key(text: &str) -> PlatformEvent {
    PlatformEvent::Key {
        symbol: KeySymbol::Unknown,
        modifiers: Modifiers::empty(),
        text: text.to_string(),
    }
}

/// Handles queued events until none are left. Timers are not ticked.
fn settle<M: Midend>(fe: &mut Frontend<HeadlessDriver, M>) {
    loop {
        let events = fe.driver_mut().drain_events();
        if events.is_empty() {
            break;
        }
        for event in events {
            fe.handle_event(event).unwrap();
        }
    }
}

#[test_log::test]
fn one_filled_rect_blits_exactly_its_area() {
    let midend = OneRect {
        primitives: vec![(10, 10, 50, 50)],
    };
    let mut fe = Frontend::new(HeadlessDriver::new(), midend, Config::default()).unwrap();
    settle(&mut fe);

    let window = fe.driver().window().unwrap();
    assert_eq!((window.width, window.height), (400, 400));

    fe.driver_mut().clear_blits();
    let before = fe.driver().visible().clone();
    fe.handle_event(type_key("d")).unwrap();

    assert_eq!(fe.driver().blits(), &[PixelRect::new(10, 10, 50, 50)]);
    let after = fe.driver().visible();
    for y in 0..400 {
        for x in 0..400 {
            let inside = (10..60).contains(&x) && (10..60).contains(&y);
            if inside {
                assert_eq!(after.get(x, y), Some(0xffffff), "({x}, {y})");
            } else {
                assert_eq!(after.get(x, y), before.get(x, y), "({x}, {y})");
            }
        }
    }
}

#[test_log::test]
fn damage_is_the_union_of_primitive_boxes() {
    let midend = OneRect {
        primitives: vec![(10, 10, 50, 50), (200, 300, 5, 5), (20, 20, 10, 10)],
    };
    let mut fe = Frontend::new(HeadlessDriver::new(), midend, Config::default()).unwrap();
    settle(&mut fe);
    fe.driver_mut().clear_blits();
    fe.handle_event(type_key("d")).unwrap();
    assert_eq!(fe.driver().blits(), &[PixelRect::new(10, 10, 195, 295)]);
}

#[test_log::test]
fn empty_session_blits_nothing() {
    let midend = OneRect { primitives: vec![] };
    let mut fe = Frontend::new(HeadlessDriver::new(), midend, Config::default()).unwrap();
    settle(&mut fe);
    fe.driver_mut().clear_blits();
    fe.handle_event(type_key("e")).unwrap();
    assert!(fe.driver().blits().is_empty());
}

#[test_log::test]
fn run_returns_once_the_engine_quits() {
    let midend = OneRect { primitives: vec![] };
    let mut fe = Frontend::new(HeadlessDriver::new(), midend, Config::default()).unwrap();
    fe.driver_mut().push_event(type_key("q"));
    fe.driver_mut().push_event(type_key("d"));
    fe.run().unwrap();
    assert!(fe.is_closed());
}

#[test_log::test]
fn colour_failure_is_reported_with_eight_bit_hex() {
    let driver = HeadlessDriver::new().with_colour_capacity(1);
    let midend = OneRect { primitives: vec![] };
    let err = Frontend::new(driver, midend, Config::default())
        .err()
        .unwrap();
    assert!(matches!(err, FrontendError::ColourAllocation { .. }));
    assert_eq!(err.to_string(), "couldn't allocate colour 1 (#ffffff)");
}

#[test_log::test]
fn test_card_plays_through_the_front_end() {
    let mut fe = Frontend::new(HeadlessDriver::new(), TestCard::default(), Config::default()).unwrap();
    settle(&mut fe);
    assert!(fe.driver().status_text().starts_with("Moves: 0"));
    assert_eq!(fe.state().fonts().len(), 1);

    // Click the top-left tile.
    fe.handle_event(PlatformEvent::Button(ButtonEvent::press(
        1,
        20,
        20,
        Modifiers::empty(),
    )))
    .unwrap();
    assert_eq!(fe.midend().moves(), 1);
    assert!(fe.driver().status_text().starts_with("Moves: 1"));

    // Undo through the menu, then move the cursor diagonally.
    fe.handle_event(PlatformEvent::Menu(MenuAction::Key(Command::Char(b'u'))))
        .unwrap();
    assert_eq!(fe.midend().moves(), 0);
    fe.handle_event(PlatformEvent::Key {
        symbol: KeySymbol::KeypadPageDown,
        modifiers: Modifiers::empty(),
        text: String::new(),
    })
    .unwrap();
    assert_eq!(fe.midend().cursor(), (1, 1));

    // Switching preset resizes the canvas and the buffer.
    fe.handle_event(PlatformEvent::Menu(MenuAction::Preset(1)))
        .unwrap();
    settle(&mut fe);
    let (w, h) = fe.midend().size();
    let buffer = fe.driver().buffer().unwrap();
    assert_eq!((buffer.width(), buffer.height()), (w, h));
    assert_eq!(fe.driver().window().unwrap().width, w);

    let status = fe.handle_event(type_key("q")).unwrap();
    assert_eq!(status, FrontendStatus::Closed);
}

#[test_log::test]
fn solving_the_test_card_runs_the_flash_animation() {
    let mut card = TestCard::default();
    card.new_game(None);
    let mut fe = Frontend::new(HeadlessDriver::new(), card, Config::default()).unwrap();
    settle(&mut fe);

    // Solve by pressing every lit tile with a right click (single toggle).
    let lit: Vec<usize> = fe
        .midend()
        .lit()
        .iter()
        .enumerate()
        .filter(|(_, l)| **l)
        .map(|(i, _)| i)
        .collect();
    for i in lit {
        let (tx, ty) = ((i % 5) as i32, (i / 5) as i32);
        fe.handle_event(PlatformEvent::Button(ButtonEvent::press(
            3,
            16 + tx * 32 + 5,
            16 + ty * 32 + 5,
            Modifiers::empty(),
        )))
        .unwrap();
    }
    assert!(fe.midend().is_solved());
    assert!(fe.midend().is_flashing());
    assert!(fe.state().timer().is_active());

    fe.run().unwrap();
    assert!(!fe.midend().is_flashing());
    assert!(!fe.state().timer().is_active());
    assert_eq!(fe.driver().active_timers(), 0);
    // 0.3 s of flash at 20 ms per tick.
    assert!(fe.driver().clock().as_millis() >= 300);
}

#[test_log::test]
fn text_uses_one_cached_font_across_redraws() {
    struct Label;
    impl Midend for Label {
        type Params = ();
        fn new_game(&mut self, _saved: Option<&str>) {}
        fn size(&self) -> (i32, i32) {
            (100, 50)
        }
        fn num_presets(&self) -> usize {
            0
        }
        fn fetch_preset(&self, _index: usize) -> Option<(String, ())> {
            None
        }
        fn colours(&mut self, _fe: &dyn DrawingApi) -> Vec<f32> {
            vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]
        }
        fn wants_statusbar(&self) -> bool {
            false
        }
        fn process_key(&mut self, fe: &mut dyn DrawingApi, _x: i32, _y: i32, _c: Command) -> bool {
            self.redraw(fe);
            true
        }
        fn timer(&mut self, _fe: &mut dyn DrawingApi, _elapsed: f32) {}
        fn redraw(&mut self, fe: &mut dyn DrawingApi) {
            fe.start_draw();
            fe.draw_text(50, 25, FontFamily::Fixed, 16, Align::centred(), 1, "OK");
            fe.end_draw();
        }
        fn params(&self) {}
        fn set_params(&mut self, _params: &()) {}
    }

    let mut fe = Frontend::new(HeadlessDriver::new(), Label, Config::default()).unwrap();
    settle(&mut fe);
    fe.handle_event(type_key("x")).unwrap();
    fe.handle_event(type_key("y")).unwrap();
    assert_eq!(fe.state().fonts().len(), 1);
    assert_eq!(fe.driver().font_loads(), &[("variable".to_string(), 16)]);
}
