use std::collections::BTreeMap;

use anyhow::Result;
use contracts::domain::a001_product::{Product, ProductId};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub parent_id: Option<i64>,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub regular_price: Option<f64>,
    pub sale_price: Option<f64>,
    pub stock_quantity: Option<i64>,
    pub in_stock: bool,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub images_json: String,
    pub category_ids_json: String,
    pub meta_json: String,
    pub attributes_json: String,
    pub published: bool,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Product {
    fn from(m: Model) -> Self {
        let images: Vec<String> = serde_json::from_str(&m.images_json).unwrap_or_default();
        let category_ids: Vec<i64> =
            serde_json::from_str(&m.category_ids_json).unwrap_or_default();
        let meta: BTreeMap<String, String> =
            serde_json::from_str(&m.meta_json).unwrap_or_default();
        let attributes: BTreeMap<String, String> =
            serde_json::from_str(&m.attributes_json).unwrap_or_default();

        Product {
            id: ProductId(m.id),
            parent_id: m.parent_id.map(ProductId),
            sku: m.sku,
            name: m.name,
            description: m.description,
            regular_price: m.regular_price,
            sale_price: m.sale_price,
            stock_quantity: m.stock_quantity,
            in_stock: m.in_stock,
            length: m.length,
            width: m.width,
            height: m.height,
            weight: m.weight,
            images,
            category_ids,
            meta,
            attributes,
            published: m.published,
            updated_at: m.updated_at,
        }
    }
}

fn to_active_model(p: &Product) -> Result<ActiveModel> {
    Ok(ActiveModel {
        id: Set(p.id.value()),
        parent_id: Set(p.parent_id.map(|id| id.value())),
        sku: Set(p.sku.clone()),
        name: Set(p.name.clone()),
        description: Set(p.description.clone()),
        regular_price: Set(p.regular_price),
        sale_price: Set(p.sale_price),
        stock_quantity: Set(p.stock_quantity),
        in_stock: Set(p.in_stock),
        length: Set(p.length),
        width: Set(p.width),
        height: Set(p.height),
        weight: Set(p.weight),
        images_json: Set(serde_json::to_string(&p.images)?),
        category_ids_json: Set(serde_json::to_string(&p.category_ids)?),
        meta_json: Set(serde_json::to_string(&p.meta)?),
        attributes_json: Set(serde_json::to_string(&p.attributes)?),
        published: Set(p.published),
        updated_at: Set(p.updated_at),
    })
}

/// All published products ordered by id, variations included.
pub async fn list_published() -> Result<Vec<Product>> {
    let models = Entity::find()
        .filter(Column::Published.eq(true))
        .order_by_asc(Column::Id)
        .all(get_connection())
        .await?;
    Ok(models.into_iter().map(Into::into).collect())
}

pub async fn count() -> Result<u64> {
    Ok(Entity::find().count(get_connection()).await?)
}

pub async fn upsert(product: &Product) -> Result<()> {
    let active = to_active_model(product)?;
    Entity::insert(active)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(Column::Id)
                .update_columns([
                    Column::ParentId,
                    Column::Sku,
                    Column::Name,
                    Column::Description,
                    Column::RegularPrice,
                    Column::SalePrice,
                    Column::StockQuantity,
                    Column::InStock,
                    Column::Length,
                    Column::Width,
                    Column::Height,
                    Column::Weight,
                    Column::ImagesJson,
                    Column::CategoryIdsJson,
                    Column::MetaJson,
                    Column::AttributesJson,
                    Column::Published,
                    Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(get_connection())
        .await?;
    Ok(())
}
