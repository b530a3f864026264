use super::ExecutionContext;
use crate::core::{Column, DataType, Result, Value};
use crate::metamodel::{
    CollectionElement, CollectionIndex, CollectionKey, IndexSource, NavigablePath,
};
use crate::result::RowView;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionExpression {
    Column(String),
    Formula(String),
}

impl fmt::Display for SelectionExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(name) => f.write_str(name),
            Self::Formula(formula) => write!(f, "({})", formula),
        }
    }
}

/// One selected expression and its position in result rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlSelection {
    pub position: usize,
    pub expression: SelectionExpression,
    pub alias: String,
}

/// Per-build state shared by the domain results of one query.
///
/// Each state has its own id and selection list; selections are never
/// shared between states.
#[derive(Debug)]
pub struct DomainResultCreationState {
    build_id: Uuid,
    selections: Vec<SqlSelection>,
}

impl DomainResultCreationState {
    pub fn new() -> Self {
        Self {
            build_id: Uuid::new_v4(),
            selections: Vec::new(),
        }
    }

    pub fn build_id(&self) -> Uuid {
        self.build_id
    }

    /// Allocate a new selection at the next row position.
    pub fn add_selection(&mut self, expression: SelectionExpression) -> SqlSelection {
        let position = self.selections.len();
        let selection = SqlSelection {
            position,
            expression,
            alias: format!("c{}_", position),
        };
        self.selections.push(selection.clone());
        selection
    }

    pub fn selections(&self) -> &[SqlSelection] {
        &self.selections
    }
}

impl Default for DomainResultCreationState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainResultKind {
    Basic(Column),
    EntityReference { entity_name: String, id_type: DataType },
}

/// How to extract one logical value from a result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainResult {
    pub navigable_path: NavigablePath,
    pub result_variable: Option<String>,
    pub selected: bool,
    pub selection: SqlSelection,
    pub kind: DomainResultKind,
    pub build_id: Uuid,
}

impl DomainResult {
    pub fn assemble(&self, row: RowView<'_>, ctx: &mut dyn ExecutionContext) -> Result<Value> {
        let raw = row.get(self.selection.position)?.clone();
        match &self.kind {
            DomainResultKind::Basic(column) => column.read(raw),
            DomainResultKind::EntityReference {
                entity_name,
                id_type,
            } => {
                if raw.is_null() {
                    return Ok(Value::Null);
                }
                let id = id_type.coerce(raw)?;
                Ok(Value::Entity(ctx.resolve_entity(entity_name, id)?))
            }
        }
    }
}

/// Builds domain results for the parts of a collection.
pub trait DomainResultGenerator {
    fn collection_key_result(
        &self,
        path: &NavigablePath,
        key: &CollectionKey,
        state: &mut DomainResultCreationState,
    ) -> DomainResult;

    fn collection_index_result(
        &self,
        path: &NavigablePath,
        index: &CollectionIndex,
        selected: bool,
        result_variable: Option<&str>,
        state: &mut DomainResultCreationState,
    ) -> DomainResult;

    fn collection_element_result(
        &self,
        path: &NavigablePath,
        element: &CollectionElement,
        selected: bool,
        result_variable: Option<&str>,
        state: &mut DomainResultCreationState,
    ) -> DomainResult;
}

/// Default generator: one selection per collection part.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlAstHelper;

impl DomainResultGenerator for SqlAstHelper {
    fn collection_key_result(
        &self,
        path: &NavigablePath,
        key: &CollectionKey,
        state: &mut DomainResultCreationState,
    ) -> DomainResult {
        let selection = state.add_selection(SelectionExpression::Column(key.column.clone()));
        DomainResult {
            navigable_path: path.clone(),
            result_variable: None,
            selected: true,
            selection,
            kind: DomainResultKind::Basic(Column::new(key.column.clone(), key.data_type.clone())),
            build_id: state.build_id(),
        }
    }

    fn collection_index_result(
        &self,
        path: &NavigablePath,
        index: &CollectionIndex,
        selected: bool,
        result_variable: Option<&str>,
        state: &mut DomainResultCreationState,
    ) -> DomainResult {
        let (expression, name) = match index.source() {
            IndexSource::Column(column) => {
                (SelectionExpression::Column(column.clone()), column.clone())
            }
            IndexSource::Formula(formula) => (
                SelectionExpression::Formula(formula.clone()),
                CollectionIndex::NAVIGABLE_NAME.to_string(),
            ),
        };
        let selection = state.add_selection(expression);
        DomainResult {
            navigable_path: path.clone(),
            result_variable: result_variable.map(str::to_string),
            selected,
            selection,
            kind: DomainResultKind::Basic(Column::new(name, index.data_type().clone())),
            build_id: state.build_id(),
        }
    }

    fn collection_element_result(
        &self,
        path: &NavigablePath,
        element: &CollectionElement,
        selected: bool,
        result_variable: Option<&str>,
        state: &mut DomainResultCreationState,
    ) -> DomainResult {
        let selection = state.add_selection(SelectionExpression::Column(
            element.column_name().to_string(),
        ));
        let kind = match element {
            CollectionElement::Basic(column) => DomainResultKind::Basic(column.clone()),
            CollectionElement::Entity {
                entity_name,
                id_type,
                ..
            } => DomainResultKind::EntityReference {
                entity_name: entity_name.clone(),
                id_type: id_type.clone(),
            },
        };
        DomainResult {
            navigable_path: path.clone(),
            result_variable: result_variable.map(str::to_string),
            selected,
            selection,
            kind,
            build_id: state.build_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::IndexMapping;
    use crate::results::{LockMode, PersistenceContext};

    #[test]
    fn test_selections_are_positional() {
        let mut state = DomainResultCreationState::new();
        let a = state.add_selection(SelectionExpression::Column("a".into()));
        let b = state.add_selection(SelectionExpression::Formula("lower(b)".into()));

        assert_eq!(a.position, 0);
        assert_eq!(b.position, 1);
        assert_eq!(b.expression.to_string(), "(lower(b))");
        assert_eq!(state.selections().len(), 2);
    }

    #[test]
    fn test_states_have_distinct_build_ids() {
        assert_ne!(
            DomainResultCreationState::new().build_id(),
            DomainResultCreationState::new().build_id()
        );
    }

    #[test]
    fn test_index_result_assembles_coerced_value() {
        let index = CollectionIndex::from_mapping(
            &IndexMapping::column("slot", DataType::Integer),
            "A.b",
        )
        .unwrap();
        let mut state = DomainResultCreationState::new();
        let path = NavigablePath::new("A").append("b").append(CollectionIndex::NAVIGABLE_NAME);
        let result = SqlAstHelper.collection_index_result(&path, &index, true, None, &mut state);

        let row = vec![Value::Float(3.0)];
        let mut ctx = PersistenceContext::new(LockMode::None);
        let value = result.assemble(RowView::new(&row), &mut ctx).unwrap();
        assert_eq!(value, Value::Integer(3));
    }

    #[test]
    fn test_entity_reference_resolves_through_context() {
        let element = CollectionElement::Entity {
            entity_name: "Product".into(),
            column: "product_id".into(),
            id_type: DataType::Integer,
        };
        let mut state = DomainResultCreationState::new();
        let path = NavigablePath::new("Order").append("lines");
        let result =
            SqlAstHelper.collection_element_result(&path, &element, true, None, &mut state);

        let mut ctx = PersistenceContext::new(LockMode::None);
        let row = vec![Value::Integer(9)];
        let first = result.assemble(RowView::new(&row), &mut ctx).unwrap();
        let second = result.assemble(RowView::new(&row), &mut ctx).unwrap();
        assert!(first.same_instance(&second));

        let null_row = vec![Value::Null];
        assert!(result.assemble(RowView::new(&null_row), &mut ctx).unwrap().is_null());
    }
}
