// Coin purchases. Works for any connected player, in or out of a room.

use crate::domain::Player;
use crate::domain::tuning::shop::find_item;
use crate::domain::tuning::{Ability, PlayerClass, ShopItemKind};
use crate::use_cases::types::{ActionError, ServerEvent};
use rand::Rng;
use rand::seq::SliceRandom;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Purchase {
    Skin(String),
    Ability(Ability),
}

/// Charges the player for an item and applies it. Nothing is charged when the purchase is
/// refused.
pub fn buy_item<R: Rng + ?Sized>(
    player: &mut Player,
    item_id: &str,
    rng: &mut R,
) -> Result<Purchase, ActionError> {
    let item = find_item(item_id).ok_or(ActionError::UnknownItem)?;
    if player.coins < item.price {
        return Err(ActionError::InsufficientFunds);
    }

    let purchase = match item.kind {
        ShopItemKind::Skin => {
            if player.skins.contains(item.id) {
                return Err(ActionError::AlreadyOwned);
            }
            player.skins.insert(item.id.to_string());
            Purchase::Skin(item.id.to_string())
        }
        ShopItemKind::AbilityUnlock => {
            let ability = draw_locked_ability(player, rng).ok_or(ActionError::NothingToUnlock)?;
            player.unlocked.unlock(ability);
            Purchase::Ability(ability)
        }
    };

    player.coins -= item.price;
    Ok(purchase)
}

/// Mystery unlock: a random class that still has locked abilities, then one of those.
fn draw_locked_ability<R: Rng + ?Sized>(player: &Player, rng: &mut R) -> Option<Ability> {
    let classes: Vec<PlayerClass> = PlayerClass::ALL
        .into_iter()
        .filter(|class| !player.unlocked.locked(*class).is_empty())
        .collect();
    let class = classes.choose(rng)?;
    player.unlocked.locked(*class).choose(rng).copied()
}

pub fn shop_data(player: &Player) -> ServerEvent {
    ServerEvent::ShopData {
        coins: player.coins,
        unlocked: player.unlocked.clone(),
        skins: player.skins.iter().cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlayerId;
    use crate::domain::tuning::PlayerTuning;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn player(coins: u32) -> Player {
        let mut player = Player::new(PlayerId(1), "Player1".to_string(), &PlayerTuning::default());
        player.coins = coins;
        player
    }

    #[test]
    fn when_buying_skin_then_coins_are_spent_once() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut buyer = player(300);

        assert_eq!(
            buy_item(&mut buyer, "skin2", &mut rng),
            Ok(Purchase::Skin("skin2".to_string()))
        );
        assert_eq!(
            buy_item(&mut buyer, "skin2", &mut rng),
            Err(ActionError::AlreadyOwned)
        );
        assert_eq!(buyer.coins, 150);
        assert!(buyer.skins.contains("skin2"));
    }

    #[test]
    fn when_balance_is_short_then_purchase_is_refused_without_charge() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut buyer = player(100);

        assert_eq!(
            buy_item(&mut buyer, "ability1", &mut rng),
            Err(ActionError::InsufficientFunds)
        );
        assert_eq!(
            buy_item(&mut buyer, "sword", &mut rng),
            Err(ActionError::UnknownItem)
        );
        assert_eq!(buyer.coins, 100);
    }

    #[test]
    fn when_buying_unlocks_then_each_one_grants_a_new_ability_until_none_are_left() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut buyer = player(200 * 10);

        // Three classes with three locked abilities each.
        for _ in 0..9 {
            let Ok(Purchase::Ability(ability)) = buy_item(&mut buyer, "ability1", &mut rng) else {
                panic!("expected an unlock");
            };
            assert!(buyer.unlocked.contains(ability.class(), ability));
        }
        assert!(
            PlayerClass::ALL
                .into_iter()
                .all(|class| buyer.unlocked.locked(class).is_empty())
        );

        assert_eq!(
            buy_item(&mut buyer, "ability1", &mut rng),
            Err(ActionError::NothingToUnlock)
        );
        assert_eq!(buyer.coins, 200);
    }
}
