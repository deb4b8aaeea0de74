// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Shape contracts for the data a client stores in the entity database.
//!
//! The database never inspects the contents of these types. It only needs
//! their size, their runtime identity and, for views, where the identifier
//! lives.

use crate::ecs::egid::Egid;

/// A concrete aggregate holding the component fields of one entity.
///
/// Implementers are composed, not layered: one named field per logical
/// component role (transform, bounds, renderable flags, ...). They are
/// reserved once into pointer-stable bucket storage and only destroyed when
/// the whole database is torn down.
///
/// Usually derived with `#[derive(Implementer)]`.
pub trait Implementer: 'static {}

/// A lightweight projection over implementer storage, tagged with an [`Egid`].
///
/// Views are stored contiguously per `(view type, group)` so systems can
/// iterate all of them in one slice. A view never owns component data; it
/// refers to implementers through handles.
///
/// Usually derived with `#[derive(EntityView)]`, which uses the field named
/// `egid` (or the field marked `#[egid]`).
pub trait EntityView: Default + 'static {
    /// Returns the identifier this view was reserved under.
    fn egid(&self) -> Egid;

    /// Stamps the identifier into the view. Called once by the registry.
    fn set_egid(&mut self, egid: Egid);
}
