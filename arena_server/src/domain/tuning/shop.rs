/// Shop catalog. Prices are in coins.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShopItemKind {
    Skin,
    /// Unlocks one random locked ability of a random class.
    AbilityUnlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopItem {
    pub id: &'static str,
    pub name: &'static str,
    pub price: u32,
    pub kind: ShopItemKind,
}

pub const SHOP_ITEMS: [ShopItem; 3] = [
    ShopItem {
        id: "skin1",
        name: "Neon Glow",
        price: 100,
        kind: ShopItemKind::Skin,
    },
    ShopItem {
        id: "skin2",
        name: "Synthwave",
        price: 150,
        kind: ShopItemKind::Skin,
    },
    ShopItem {
        id: "ability1",
        name: "Unlock Ability",
        price: 200,
        kind: ShopItemKind::AbilityUnlock,
    },
];

pub fn find_item(item_id: &str) -> Option<&'static ShopItem> {
    SHOP_ITEMS.iter().find(|item| item.id == item_id)
}

impl ShopItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skin => "skin",
            Self::AbilityUnlock => "ability",
        }
    }
}
