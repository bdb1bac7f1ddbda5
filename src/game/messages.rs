//! The game message log.
//!
//! Messages are what players read ("Kaiu Engineer loses 1 honor for not
//! defending the conflict."). They are not log lines.

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, PlayerId};
use crate::rings::Element;

use super::Game;

/// A value substituted into a message template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageArg {
    Player(PlayerId),
    Card(EntityId),
    Ring(Element),
    Number(i32),
    Text(String),
}

/// One posted message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMessage {
    pub round: u32,
    pub text: String,
    pub args: Vec<MessageArg>,
}

impl Game {
    /// Post a message. `{0}`, `{1}`, ... are replaced by `args`.
    pub fn add_message(&mut self, template: &str, args: &[MessageArg]) {
        let text = self.format_message(template, args);
        self.messages.push_back(GameMessage {
            round: self.state.round,
            text,
            args: args.to_vec(),
        });
    }

    #[must_use]
    pub fn messages(&self) -> &im::Vector<GameMessage> {
        &self.messages
    }

    fn format_message(&self, template: &str, args: &[MessageArg]) -> String {
        let mut text = template.to_string();
        for (index, arg) in args.iter().enumerate() {
            let placeholder = format!("{{{index}}}");
            if text.contains(&placeholder) {
                text = text.replace(&placeholder, &self.render_arg(arg));
            }
        }
        text
    }

    fn render_arg(&self, arg: &MessageArg) -> String {
        match arg {
            MessageArg::Player(player) => {
                if player.index() < self.state.player_count() {
                    self.state.player(*player).name.clone()
                } else {
                    player.to_string()
                }
            }
            MessageArg::Card(card) => self
                .state
                .card(*card)
                .and_then(|c| self.registry.get(c.card_id))
                .map_or_else(|| card.to_string(), |def| def.name.clone()),
            MessageArg::Ring(element) => element.name().to_string(),
            MessageArg::Number(n) => n.to_string(),
            MessageArg::Text(text) => text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardDefinition, CardId, CardRegistry};
    use crate::core::GameConfig;
    use crate::zones::Location;
    use std::rc::Rc;

    #[test]
    fn test_placeholders() {
        let mut registry = CardRegistry::new();
        registry.register(CardDefinition::character(CardId::new(3), "Kaiu Engineer", 2, 1, 1));
        let config = GameConfig::default().with_player_names("Hida", "Doji");
        let mut game = Game::new(config, Rc::new(registry));
        let card = game.create_card(CardId::new(3), PlayerId::new(0), Location::PlayArea).unwrap();

        game.add_message(
            "{0} uses {1} on the {2} ring and gains {3}",
            &[
                MessageArg::Player(PlayerId::new(1)),
                MessageArg::Card(card),
                MessageArg::Ring(Element::Fire),
                MessageArg::Number(2),
            ],
        );

        let message = game.messages().back().unwrap();
        assert_eq!(message.text, "Doji uses Kaiu Engineer on the Fire ring and gains 2");
        assert_eq!(message.args.len(), 4);
    }

    #[test]
    fn test_unused_args_are_ignored() {
        let mut game = Game::new(GameConfig::default(), Rc::new(CardRegistry::new()));
        game.add_message("nothing to see", &[MessageArg::Number(1)]);
        assert_eq!(game.messages().back().unwrap().text, "nothing to see");
    }
}
