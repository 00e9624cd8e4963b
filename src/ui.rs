//! Menu panel switcher
//!
//! Pure UI state: which overlay is showing, which button has focus and what
//! the HUD labels read. The simulation drives it through `GameEvent`s and the
//! buttons drive the simulation back. The wasm32 host mirrors this onto the
//! DOM each frame.

use crate::sim::{GameEvent, GameState};

/// Overlay shown on top of the play-field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Start,
    NextWave,
    Game,
    GameOver,
}

/// Buttons that can hold focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    StartGame,
    NextWave,
    /// The game over panel's only button
    BackToStart,
}

impl Button {
    /// DOM element id for the host
    pub fn element_id(&self) -> &'static str {
        match self {
            Button::StartGame => "start-button",
            Button::NextWave => "next-wave-button",
            Button::BackToStart => "back-to-start-button",
        }
    }
}

/// Which UI elements are visible for a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelVisibility {
    pub background: bool,
    pub start_button: bool,
    pub next_wave_button: bool,
    pub game_over: bool,
}

impl PanelVisibility {
    pub fn for_panel(panel: Panel) -> Self {
        Self {
            background: panel != Panel::Game,
            start_button: panel == Panel::Start,
            next_wave_button: panel == Panel::NextWave,
            game_over: panel == Panel::GameOver,
        }
    }
}

/// Menu state
#[derive(Debug, Clone)]
pub struct UiState {
    panel: Panel,
    selected: Option<Button>,
    /// Score label text
    pub score_label: String,
    /// Wave label text
    pub wave_label: String,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    /// Opens on the start panel with its button focused
    pub fn new() -> Self {
        let mut ui = Self {
            panel: Panel::Start,
            selected: None,
            score_label: "0".to_string(),
            wave_label: "1".to_string(),
        };
        ui.set_panel(Panel::Start);
        ui
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn selected(&self) -> Option<Button> {
        self.selected
    }

    pub fn visibility(&self) -> PanelVisibility {
        PanelVisibility::for_panel(self.panel)
    }

    /// Pointer is locked and hidden while playing, since it has no use there
    pub fn cursor_locked(&self) -> bool {
        self.panel == Panel::Game
    }

    pub fn set_panel(&mut self, panel: Panel) {
        log::debug!("UI panel: {:?} -> {:?}", self.panel, panel);
        self.panel = panel;
        self.selected = match panel {
            Panel::Start => Some(Button::StartGame),
            Panel::NextWave => Some(Button::NextWave),
            Panel::GameOver => Some(Button::BackToStart),
            Panel::Game => None,
        };
    }

    /// React to a simulation event
    pub fn handle_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::WaveStarted(wave) => self.wave_label = wave.to_string(),
            GameEvent::ScoreChanged(score) => self.score_label = score.to_string(),
            GameEvent::WaveCleared => self.set_panel(Panel::NextWave),
            GameEvent::GameOver => self.set_panel(Panel::GameOver),
            _ => {}
        }
    }

    // === Button actions ===

    pub fn start_game(&mut self, game: &mut GameState) {
        self.set_panel(Panel::Game);
        game.start_game();
    }

    pub fn start_next_wave(&mut self, game: &mut GameState) {
        self.set_panel(Panel::Game);
        game.next_wave();
    }

    pub fn back_to_start(&mut self, game: &mut GameState) {
        self.set_panel(Panel::Start);
        game.reset_game();
    }

    /// Press a button. Ignored unless it is showing on the current panel.
    pub fn press(&mut self, button: Button, game: &mut GameState) -> bool {
        match (button, self.panel) {
            (Button::StartGame, Panel::Start) => self.start_game(game),
            (Button::NextWave, Panel::NextWave) => self.start_next_wave(game),
            (Button::BackToStart, Panel::GameOver) => self.back_to_start(game),
            _ => {
                log::warn!("Ignoring {:?} press on {:?} panel", button, self.panel);
                return false;
            }
        }
        true
    }

    /// Press whichever button has focus
    pub fn confirm(&mut self, game: &mut GameState) -> bool {
        match self.selected {
            Some(button) => self.press(button, game),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::GamePhase;
    use crate::tuning::GameSettings;

    fn drain_into(ui: &mut UiState, game: &mut GameState) {
        for event in game.drain_events() {
            ui.handle_event(&event);
        }
    }

    #[test]
    fn test_opens_on_start_panel() {
        let ui = UiState::new();
        assert_eq!(ui.panel(), Panel::Start);
        assert_eq!(ui.selected(), Some(Button::StartGame));
        assert!(!ui.cursor_locked());

        let vis = ui.visibility();
        assert!(vis.background);
        assert!(vis.start_button);
        assert!(!vis.next_wave_button);
        assert!(!vis.game_over);
    }

    #[test]
    fn test_game_panel_hides_everything() {
        let vis = PanelVisibility::for_panel(Panel::Game);
        assert_eq!(
            vis,
            PanelVisibility {
                background: false,
                start_button: false,
                next_wave_button: false,
                game_over: false,
            }
        );
    }

    #[test]
    fn test_exactly_one_panel_element_per_menu() {
        for panel in [Panel::Start, Panel::NextWave, Panel::GameOver] {
            let vis = PanelVisibility::for_panel(panel);
            let shown = [vis.start_button, vis.next_wave_button, vis.game_over]
                .iter()
                .filter(|v| **v)
                .count();
            assert_eq!(shown, 1, "{panel:?}");
            assert!(vis.background);
        }
    }

    #[test]
    fn test_confirm_starts_game() {
        let mut ui = UiState::new();
        let mut game = GameState::new(1, GameSettings::default());

        assert!(ui.confirm(&mut game));
        drain_into(&mut ui, &mut game);

        assert_eq!(ui.panel(), Panel::Game);
        assert!(ui.cursor_locked());
        assert_eq!(ui.selected(), None);
        assert_eq!(game.phase, GamePhase::Wave);
        assert_eq!(ui.wave_label, "1");
        assert_eq!(ui.score_label, "0");

        // Nothing to confirm mid-game
        assert!(!ui.confirm(&mut game));
    }

    #[test]
    fn test_labels_follow_events() {
        let mut ui = UiState::new();
        ui.handle_event(&GameEvent::ScoreChanged(42));
        ui.handle_event(&GameEvent::WaveStarted(7));
        assert_eq!(ui.score_label, "42");
        assert_eq!(ui.wave_label, "7");
        assert_eq!(ui.panel(), Panel::Start);
    }

    #[test]
    fn test_wave_cleared_offers_next_wave() {
        let mut ui = UiState::new();
        let mut game = GameState::new(1, GameSettings::default());
        ui.start_game(&mut game);

        ui.handle_event(&GameEvent::WaveCleared);
        assert_eq!(ui.panel(), Panel::NextWave);
        assert_eq!(ui.selected(), Some(Button::NextWave));
        assert!(!ui.cursor_locked());

        assert!(ui.confirm(&mut game));
        drain_into(&mut ui, &mut game);
        assert_eq!(ui.panel(), Panel::Game);
        assert_eq!(ui.wave_label, "2");
    }

    #[test]
    fn test_game_over_returns_to_start() {
        let mut ui = UiState::new();
        let mut game = GameState::new(1, GameSettings::default());
        ui.start_game(&mut game);

        ui.handle_event(&GameEvent::GameOver);
        assert_eq!(ui.panel(), Panel::GameOver);
        assert_eq!(ui.selected(), Some(Button::BackToStart));

        assert!(ui.confirm(&mut game));
        assert_eq!(ui.panel(), Panel::Start);
        assert_eq!(game.phase, GamePhase::Attract);
        assert!(game.invaders.is_empty());
    }

    #[test]
    fn test_press_ignores_hidden_buttons() {
        let mut ui = UiState::new();
        let mut game = GameState::new(1, GameSettings::default());

        assert!(!ui.press(Button::NextWave, &mut game));
        assert!(!ui.press(Button::BackToStart, &mut game));
        assert_eq!(ui.panel(), Panel::Start);
        assert_eq!(game.phase, GamePhase::Attract);
    }
}
