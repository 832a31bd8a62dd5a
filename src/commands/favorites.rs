use crate::context::AppContext;
use crate::errors::Result;
use crate::favorites::{Category, FavoriteItem};

pub fn add_favorite(ctx: &AppContext, id: i64, name: &str, category: Category) -> Result<()> {
    ctx.use_favorites()?
        .add_favorite(FavoriteItem::new(id, category, name));
    Ok(())
}

pub fn remove_favorite(ctx: &AppContext, id: i64, category: Category) -> Result<()> {
    ctx.use_favorites()?.remove_favorite(id, category);
    Ok(())
}

pub fn toggle_favorite(ctx: &AppContext, id: i64, name: &str, category: Category) -> Result<bool> {
    Ok(ctx.use_favorites()?.toggle_favorite(id, name, category))
}

pub fn is_favorite(ctx: &AppContext, id: i64, category: Category) -> Result<bool> {
    Ok(ctx.use_favorites()?.is_favorite(id, category))
}

pub fn get_favorites(ctx: &AppContext, category: Option<Category>) -> Result<Vec<FavoriteItem>> {
    let store = ctx.use_favorites()?;
    Ok(match category {
        Some(category) => store.favorites_in(category),
        None => store.favorites(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::LocalStorage;
    use crate::errors::AppError;
    use crate::favorites::FavoritesStore;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_commands_round_trip_through_context() {
        let storage = LocalStorage::new(Arc::new(MemoryStorage::new()));
        let store = FavoritesStore::new(&storage).unwrap();
        store.ready().await;
        let ctx = AppContext::new().with_favorites(store);

        add_favorite(&ctx, 42, "Concert X", Category::Events).unwrap();
        add_favorite(&ctx, 42, "Venue Y", Category::Venues).unwrap();
        assert!(is_favorite(&ctx, 42, Category::Events).unwrap());
        assert_eq!(get_favorites(&ctx, None).unwrap().len(), 2);
        assert_eq!(get_favorites(&ctx, Some(Category::Venues)).unwrap().len(), 1);

        remove_favorite(&ctx, 42, Category::Events).unwrap();
        assert!(!toggle_favorite(&ctx, 42, "Venue Y", Category::Venues).unwrap());
        assert!(get_favorites(&ctx, None).unwrap().is_empty());
    }

    #[test]
    fn test_commands_without_provider() {
        let ctx = AppContext::new();

        assert!(matches!(
            add_favorite(&ctx, 1, "X", Category::Events),
            Err(AppError::MissingProvider(_))
        ));
        assert!(matches!(
            get_favorites(&ctx, None),
            Err(AppError::MissingProvider(_))
        ));
    }
}
