#![forbid(unsafe_code)]

//! External binder: wire an existing model and control from a relation list.
//!
//! Three building blocks are composed per [`BindMode`]:
//!
//! - **observe**: for each relation, listen to the control's native change
//!   event and re-emit it on the control as [`EventType::ViewChange`], reading
//!   the property value from the control when the native event fires.
//! - **model from control**: listen to the view-change funnel and write into
//!   the model when control id and property both match the relation.
//! - **control from model**: listen to the model's change event and write into
//!   the control when the change names the relation's model property.
//!
//! Handlers hold the model and control weakly; once either side is dropped
//! the handlers become no-ops. Every write goes through the propagation guard
//! (see [`propagation`](crate::propagation)), so a write never echoes back
//! into the pair it came from during the same turn.

use std::rc::Rc;

use tracing::{debug, trace};

use crate::config::{BindConfig, DispatchMode};
use crate::emitter::handler;
use crate::entity::{Control, Model, entity_key};
use crate::error::BindError;
use crate::event::{EventType, Payload, ViewChange};
use crate::index::RelationIndex;
use crate::propagation::{Endpoint, propagate};
use crate::relation::{BindingRelation, ResolvedRelation, resolve_all};
use crate::scope::BindingSet;

/// Direction(s) wired by a bind call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindMode {
    /// Model is the source of truth.
    ModelToControl,
    /// Control is the source of truth.
    ControlToModel,
    /// Both directions.
    Dual,
}

impl BindMode {
    fn label(self) -> &'static str {
        match self {
            Self::ModelToControl => "model-to-control",
            Self::ControlToModel => "control-to-model",
            Self::Dual => "dual",
        }
    }
}

/// Sync the control whenever a bound model property changes.
pub fn bind_model_to_control<M, C>(
    model: &Rc<M>,
    control: &Rc<C>,
    relations: &[BindingRelation],
    config: &BindConfig,
) -> Result<BindingSet, BindError>
where
    M: Model + ?Sized + 'static,
    C: Control + ?Sized + 'static,
{
    bind(BindMode::ModelToControl, model, control, relations, config)
}

/// Sync the model whenever a bound control property changes.
pub fn bind_control_to_model<M, C>(
    model: &Rc<M>,
    control: &Rc<C>,
    relations: &[BindingRelation],
    config: &BindConfig,
) -> Result<BindingSet, BindError>
where
    M: Model + ?Sized + 'static,
    C: Control + ?Sized + 'static,
{
    bind(BindMode::ControlToModel, model, control, relations, config)
}

/// Keep model and control in sync in both directions.
pub fn dual_bind<M, C>(
    model: &Rc<M>,
    control: &Rc<C>,
    relations: &[BindingRelation],
    config: &BindConfig,
) -> Result<BindingSet, BindError>
where
    M: Model + ?Sized + 'static,
    C: Control + ?Sized + 'static,
{
    bind(BindMode::Dual, model, control, relations, config)
}

/// Wire `relations` between `model` and `control` in `mode`.
///
/// All relations are validated before anything is subscribed; on error no
/// subscription is left behind.
pub fn bind<M, C>(
    mode: BindMode,
    model: &Rc<M>,
    control: &Rc<C>,
    relations: &[BindingRelation],
    config: &BindConfig,
) -> Result<BindingSet, BindError>
where
    M: Model + ?Sized + 'static,
    C: Control + ?Sized + 'static,
{
    let config = config.resolve();
    let relations = resolve_all(relations, &config)?;
    let mut set = BindingSet::with_relations(relations.len());

    if matches!(mode, BindMode::ControlToModel | BindMode::Dual) {
        observe_control(control, &relations, &mut set);
        match config.dispatch {
            DispatchMode::PerRelation => {
                sync_model_per_relation(model, control, &relations, &mut set);
            }
            DispatchMode::Indexed => {
                sync_model_indexed(model, control, &relations, &mut set);
            }
        }
    }
    if matches!(mode, BindMode::ModelToControl | BindMode::Dual) {
        sync_control_with_model(model, control, &relations, &mut set);
    }

    debug!(
        mode = mode.label(),
        control = control.id(),
        relations = relations.len(),
        subscriptions = set.subscription_count(),
        dispatch = ?config.dispatch,
        "bound model and control"
    );
    Ok(set)
}

fn observe_control<C>(control: &Rc<C>, relations: &[ResolvedRelation], set: &mut BindingSet)
where
    C: Control + ?Sized + 'static,
{
    for relation in relations {
        let weak_control = Rc::downgrade(control);
        let property = relation.property.clone();
        set.hold(control.on(
            relation.control_event.clone(),
            handler(move |_event| {
                let Some(control) = weak_control.upgrade() else {
                    return Ok(());
                };
                let change = ViewChange {
                    control_id: control.id().to_owned(),
                    property: property.clone(),
                    new_value: control.get(&property),
                };
                control.delegate(
                    Some(control.id()),
                    &EventType::ViewChange,
                    Payload::ViewChange(change),
                )
            }),
        ));
    }
}

fn sync_model_per_relation<M, C>(
    model: &Rc<M>,
    control: &Rc<C>,
    relations: &[ResolvedRelation],
    set: &mut BindingSet,
) where
    M: Model + ?Sized + 'static,
    C: Control + ?Sized + 'static,
{
    let control_key = entity_key(control);
    let model_key = entity_key(model);
    for relation in relations {
        let weak_model = Rc::downgrade(model);
        let control_id = control.id().to_owned();
        let relation = relation.clone();
        set.hold(control.on(
            EventType::ViewChange,
            handler(move |event| {
                let Some(change) = event.as_view_change() else {
                    return Ok(());
                };
                if change.control_id != control_id || change.property != relation.property {
                    return Ok(());
                }
                let Some(model) = weak_model.upgrade() else {
                    return Ok(());
                };
                write_model(&*model, model_key, control_key, &relation, change)
            }),
        ));
    }
}

fn sync_model_indexed<M, C>(
    model: &Rc<M>,
    control: &Rc<C>,
    relations: &[ResolvedRelation],
    set: &mut BindingSet,
) where
    M: Model + ?Sized + 'static,
    C: Control + ?Sized + 'static,
{
    if relations.is_empty() {
        return;
    }
    let control_key = entity_key(control);
    let model_key = entity_key(model);
    let index = RelationIndex::build(control.id(), relations);
    let relations = relations.to_vec();
    let weak_model = Rc::downgrade(model);
    set.hold(control.on(
        EventType::ViewChange,
        handler(move |event| {
            let Some(change) = event.as_view_change() else {
                return Ok(());
            };
            let positions = index.lookup(&change.control_id, &change.property);
            if positions.is_empty() {
                return Ok(());
            }
            let Some(model) = weak_model.upgrade() else {
                return Ok(());
            };
            for &pos in positions {
                write_model(&*model, model_key, control_key, &relations[pos], change)?;
            }
            Ok(())
        }),
    ));
}

fn write_model<M>(
    model: &M,
    model_key: usize,
    control_key: usize,
    relation: &ResolvedRelation,
    change: &ViewChange,
) -> Result<(), BindError>
where
    M: Model + ?Sized,
{
    propagate(
        Endpoint::new(control_key, &relation.property),
        Endpoint::new(model_key, &relation.name),
        || {
            trace!(
                control = %change.control_id,
                property = %relation.property,
                model_property = %relation.name,
                "control -> model"
            );
            model.set(&relation.name, change.new_value.clone())
        },
    )
    .map(|_| ())
}

fn sync_control_with_model<M, C>(
    model: &Rc<M>,
    control: &Rc<C>,
    relations: &[ResolvedRelation],
    set: &mut BindingSet,
) where
    M: Model + ?Sized + 'static,
    C: Control + ?Sized + 'static,
{
    let control_key = entity_key(control);
    let model_key = entity_key(model);
    for relation in relations {
        let weak_control = Rc::downgrade(control);
        let relation = relation.clone();
        set.hold(model.on(
            relation.model_event.clone(),
            handler(move |event| {
                let Some(change) = event.as_change() else {
                    return Ok(());
                };
                if change.name != relation.name {
                    return Ok(());
                }
                let Some(control) = weak_control.upgrade() else {
                    return Ok(());
                };
                propagate(
                    Endpoint::new(model_key, &relation.name),
                    Endpoint::new(control_key, &relation.property),
                    || {
                        trace!(
                            control = control.id(),
                            model_property = %relation.name,
                            property = %relation.property,
                            "model -> control"
                        );
                        control.set(&relation.property, change.new_value.clone())
                    },
                )
                .map(|_| ())
            }),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Observable, PropertyHolder};
    use crate::memory::MemoryEntity;
    use serde_json::json;

    fn pair() -> (Rc<MemoryEntity>, Rc<MemoryEntity>) {
        (
            Rc::new(MemoryEntity::new("model")),
            Rc::new(MemoryEntity::new("c1")),
        )
    }

    #[test]
    fn subscription_counts_per_mode() {
        let (model, control) = pair();
        let relations = [BindingRelation::new("x", "val"), BindingRelation::new("y", "other")];
        let cfg = BindConfig::new();

        let m2c = bind_model_to_control(&model, &control, &relations, &cfg).unwrap();
        assert_eq!(m2c.subscription_count(), 2);
        let c2m = bind_control_to_model(&model, &control, &relations, &cfg).unwrap();
        assert_eq!(c2m.subscription_count(), 4);
        let dual = dual_bind(&model, &control, &relations, &cfg).unwrap();
        assert_eq!(dual.subscription_count(), 6);
        let indexed = dual_bind(
            &model,
            &control,
            &relations,
            &BindConfig::new().dispatch(DispatchMode::Indexed),
        )
        .unwrap();
        assert_eq!(indexed.subscription_count(), 5);
        assert_eq!(indexed.relation_count(), 2);
    }

    #[test]
    fn invalid_relation_leaves_no_subscriptions() {
        let (model, control) = pair();
        let relations = [BindingRelation::new("x", "val"), BindingRelation::new("", "p")];
        let err = dual_bind(&model, &control, &relations, &BindConfig::new()).unwrap_err();
        assert_eq!(err, BindError::missing(1, "name"));
        assert_eq!(model.events().total_listeners(), 0);
        assert_eq!(control.events().total_listeners(), 0);
    }

    #[test]
    fn observer_reads_value_at_fire_time() {
        let (model, control) = pair();
        let _set = bind_control_to_model(
            &model,
            &control,
            &[BindingRelation::new("x", "val")],
            &BindConfig::new(),
        )
        .unwrap();

        // Native event carries no value; the current property is read instead.
        control.input("val", json!("typed")).unwrap();
        assert_eq!(model.get("x"), json!("typed"));
    }

    #[test]
    fn foreign_view_change_is_ignored() {
        let (model, control) = pair();
        let _set = bind_control_to_model(
            &model,
            &control,
            &[BindingRelation::new("x", "val")],
            &BindConfig::new(),
        )
        .unwrap();

        let foreign = ViewChange {
            control_id: "c2".into(),
            property: "val".into(),
            new_value: json!(1),
        };
        control
            .delegate(Some("c2"), &EventType::ViewChange, Payload::ViewChange(foreign))
            .unwrap();
        assert_eq!(model.total_writes(), 0);
    }

    #[test]
    fn dropped_model_turns_handlers_into_noops() {
        let (model, control) = pair();
        let set = dual_bind(
            &model,
            &control,
            &[BindingRelation::new("x", "val")],
            &BindConfig::new(),
        )
        .unwrap();
        set.detach();
        drop(model);
        control.input("val", json!(1)).unwrap();
        assert_eq!(control.get("val"), json!(1));
    }

    #[test]
    fn model_write_error_propagates_to_firer() {
        let model = Rc::new(MemoryEntity::new("model").with_read_only("x"));
        let control = Rc::new(MemoryEntity::new("c1"));
        let _set = bind_control_to_model(
            &model,
            &control,
            &[BindingRelation::new("x", "val")],
            &BindConfig::new(),
        )
        .unwrap();

        let err = control.input("val", json!(1)).unwrap_err();
        assert!(matches!(err, BindError::PropertyWrite { ref property, .. } if property == "x"));
    }

    #[test]
    fn works_through_trait_objects() {
        let model: Rc<dyn Model> = Rc::new(MemoryEntity::new("model"));
        let control: Rc<dyn Control> = Rc::new(MemoryEntity::new("c1"));
        let _set = dual_bind(
            &model,
            &control,
            &[BindingRelation::new("x", "val")],
            &BindConfig::new(),
        )
        .unwrap();
        model.set("x", json!(5)).unwrap();
        assert_eq!(control.get("val"), json!(5));
    }

    #[test]
    #[tracing_test::traced_test]
    fn bind_and_echo_suppression_are_logged() {
        let (model, control) = pair();
        let _set = dual_bind(
            &model,
            &control,
            &[BindingRelation::new("x", "val")],
            &BindConfig::new(),
        )
        .unwrap();
        control.input("val", json!(1)).unwrap();

        assert!(logs_contain("bound model and control"));
        assert!(logs_contain("relations=1"));
        assert!(logs_contain("control -> model"));
        assert!(logs_contain("suppressed echo write"));
    }
}
