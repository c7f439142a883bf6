use anyhow::Result;
use contracts::domain::a001_product::ProductCategory;
use sea_orm::entity::prelude::*;
use sea_orm::{EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_product_category")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ProductCategory {
    fn from(m: Model) -> Self {
        ProductCategory {
            id: m.id,
            parent_id: m.parent_id,
            name: m.name,
        }
    }
}

pub async fn list_all() -> Result<Vec<ProductCategory>> {
    let models = Entity::find()
        .order_by_asc(Column::Id)
        .all(get_connection())
        .await?;
    Ok(models.into_iter().map(Into::into).collect())
}

pub async fn upsert(category: &ProductCategory) -> Result<()> {
    let active = ActiveModel {
        id: Set(category.id),
        parent_id: Set(category.parent_id),
        name: Set(category.name.clone()),
    };
    Entity::insert(active)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(Column::Id)
                .update_columns([Column::ParentId, Column::Name])
                .to_owned(),
        )
        .exec(get_connection())
        .await?;
    Ok(())
}
