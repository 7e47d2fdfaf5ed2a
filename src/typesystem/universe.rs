//! The append-only type universe.
//!
//! [`TypeUniverse`] owns every [`TypeDesc`] the engine can reason about together with the
//! user conversion operators declared on them. It is safe to share across threads: lookups
//! are lock-free, registration is atomic, and constructed types (optionals, arrays and generic
//! instantiations) are created on first request and structurally unique afterwards.
//!
//! # Token Layout
//!
//! - Declared types use [`Token::TYPE_DEF`] rows; the well-known types occupy the first rows in
//!   [`WellKnown`] order, followed by one row per [`NumericKind`]
//! - Constructed types use [`Token::TYPE_SPEC`] rows
//! - Operators use [`Token::OPERATOR`] rows
//!
//! # Thread Safety
//!
//! - Token lookup: O(log n) using a skip list
//! - Name and constructed-type lookup: O(1) average using hash indices
//! - Concurrent requests for the same constructed type converge on one descriptor

use std::sync::{
    atomic::{AtomicU32, AtomicU64, Ordering},
    Arc,
};

use crossbeam_skiplist::SkipMap;
use dashmap::{mapref::entry::Entry, DashMap};
use strum::{EnumCount, IntoEnumIterator};
use tracing::debug;

use crate::{
    typesystem::{
        ConvertFn, GenericParam, GenericParamFlags, NumericKind, Token, TypeDesc, TypeDescRc,
        TypeFlags, TypeFlavor, UserConversionOperator, UserOperatorRc, WellKnown,
    },
    Error::{TypeError, TypeInsert, TypeNotFound},
    Result,
};

/// Structural identity of a constructed type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstructedKey {
    Optional(Token),
    Array(Token, u32),
    Instance(Token, Vec<Token>),
}

/// Concurrent registry of type descriptors and declared conversion operators.
///
/// # Examples
///
/// ```rust
/// use dotconv::typesystem::{NumericKind, TypeUniverse, WellKnown};
///
/// let universe = TypeUniverse::new();
/// let int32 = universe.numeric(NumericKind::I4);
/// let optional = universe.optional_of(&int32)?;
///
/// assert_eq!(optional.fullname(), "System.Nullable`1<System.Int32>");
/// assert_eq!(universe.optional_of(&int32)?.token, optional.token);
/// assert!(universe
///     .interfaces_of(&int32)
///     .iter()
///     .any(|iface| universe.is_well_known(iface, WellKnown::IComparable)));
/// # Ok::<(), dotconv::Error>(())
/// ```
pub struct TypeUniverse {
    /// Primary storage indexed by token
    types: SkipMap<Token, TypeDescRc>,
    /// Secondary index: full name to token
    types_by_fullname: DashMap<String, Token>,
    /// Secondary index: structural identity of constructed types
    constructed: DashMap<ConstructedKey, Token>,
    /// Declared operators grouped by declaring type
    operators: DashMap<Token, Vec<UserOperatorRc>>,
    next_def: AtomicU32,
    next_spec: AtomicU32,
    next_operator: AtomicU32,
    /// Bumped whenever an operator is declared
    operator_generation: AtomicU64,
    well_known: Vec<TypeDescRc>,
    numerics: Vec<TypeDescRc>,
}

impl TypeUniverse {
    /// Create a universe populated with the well-known framework types and the numeric types
    #[must_use]
    pub fn new() -> Self {
        let mut universe = TypeUniverse {
            types: SkipMap::new(),
            types_by_fullname: DashMap::new(),
            constructed: DashMap::new(),
            operators: DashMap::new(),
            next_def: AtomicU32::new(1),
            next_spec: AtomicU32::new(1),
            next_operator: AtomicU32::new(1),
            operator_generation: AtomicU64::new(0),
            well_known: Vec::with_capacity(WellKnown::COUNT),
            numerics: Vec::with_capacity(NumericKind::COUNT),
        };

        // Rows are handed out in enum order so that cross references can be computed upfront
        let well_known_token = |wk: WellKnown| {
            let index = WellKnown::iter().position(|w| w == wk).unwrap_or_default();
            Token::from_parts(Token::TYPE_DEF, index as u32 + 1)
        };

        for wk in WellKnown::iter() {
            let token = universe.alloc_token();
            let desc = universe.publish(Self::well_known_desc(wk, token, &well_known_token));
            universe.well_known.push(desc);
        }

        let value_type = well_known_token(WellKnown::ValueType);
        for kind in NumericKind::iter() {
            let token = universe.alloc_token();
            let mut desc = TypeDesc::new(
                token,
                "System",
                kind.name(),
                TypeFlavor::Numeric(kind),
                TypeFlags::SEALED,
            );
            desc.base = Some(value_type);
            desc.interfaces = if kind == NumericKind::Char {
                vec![
                    well_known_token(WellKnown::IComparable),
                    well_known_token(WellKnown::IConvertible),
                ]
            } else {
                vec![
                    well_known_token(WellKnown::IComparable),
                    well_known_token(WellKnown::IConvertible),
                    well_known_token(WellKnown::IFormattable),
                ]
            };
            let desc = universe.publish(desc);
            universe.numerics.push(desc);
        }

        universe
    }

    fn well_known_desc(
        wk: WellKnown,
        token: Token,
        lookup: &impl Fn(WellKnown) -> Token,
    ) -> TypeDesc {
        let (flavor, flags, base, interfaces): (TypeFlavor, TypeFlags, Option<WellKnown>, &[WellKnown]) =
            match wk {
                WellKnown::Object => (TypeFlavor::Object, TypeFlags::empty(), None, &[]),
                WellKnown::ValueType => (
                    TypeFlavor::Class,
                    TypeFlags::ABSTRACT,
                    Some(WellKnown::Object),
                    &[],
                ),
                WellKnown::Enum => (
                    TypeFlavor::Class,
                    TypeFlags::ABSTRACT,
                    Some(WellKnown::ValueType),
                    &[
                        WellKnown::IComparable,
                        WellKnown::IConvertible,
                        WellKnown::IFormattable,
                    ],
                ),
                WellKnown::String => (
                    TypeFlavor::String,
                    TypeFlags::SEALED,
                    Some(WellKnown::Object),
                    &[
                        WellKnown::IComparable,
                        WellKnown::IConvertible,
                        WellKnown::ICloneable,
                        WellKnown::IEnumerable,
                    ],
                ),
                WellKnown::Boolean => (
                    TypeFlavor::Boolean,
                    TypeFlags::SEALED,
                    Some(WellKnown::ValueType),
                    &[WellKnown::IComparable, WellKnown::IConvertible],
                ),
                WellKnown::Array => (
                    TypeFlavor::Class,
                    TypeFlags::ABSTRACT,
                    Some(WellKnown::Object),
                    &[
                        WellKnown::ICloneable,
                        WellKnown::IList,
                        WellKnown::ICollection,
                        WellKnown::IEnumerable,
                    ],
                ),
                WellKnown::Delegate => (
                    TypeFlavor::Class,
                    TypeFlags::ABSTRACT,
                    Some(WellKnown::Object),
                    &[WellKnown::ICloneable],
                ),
                WellKnown::MulticastDelegate => (
                    TypeFlavor::Class,
                    TypeFlags::ABSTRACT,
                    Some(WellKnown::Delegate),
                    &[],
                ),
                WellKnown::Nullable => (
                    TypeFlavor::Struct,
                    TypeFlags::SEALED | TypeFlags::GENERIC_DEFINITION,
                    Some(WellKnown::ValueType),
                    &[],
                ),
                WellKnown::IComparable
                | WellKnown::IConvertible
                | WellKnown::IFormattable
                | WellKnown::ICloneable
                | WellKnown::IEnumerable => (TypeFlavor::Interface, TypeFlags::ABSTRACT, None, &[]),
                WellKnown::ICollection => (
                    TypeFlavor::Interface,
                    TypeFlags::ABSTRACT,
                    None,
                    &[WellKnown::IEnumerable],
                ),
                WellKnown::IList => (
                    TypeFlavor::Interface,
                    TypeFlags::ABSTRACT,
                    None,
                    &[WellKnown::ICollection, WellKnown::IEnumerable],
                ),
                WellKnown::IEnumerableT
                | WellKnown::ICollectionT
                | WellKnown::IListT
                | WellKnown::IReadOnlyCollectionT
                | WellKnown::IReadOnlyListT => (
                    TypeFlavor::Interface,
                    TypeFlags::ABSTRACT | TypeFlags::GENERIC_DEFINITION,
                    None,
                    &[WellKnown::IEnumerable],
                ),
            };

        let mut desc = TypeDesc::new(token, wk.namespace(), wk.name(), flavor, flags);
        desc.base = base.map(lookup);
        desc.interfaces = interfaces.iter().map(|i| lookup(*i)).collect();
        if flags.contains(TypeFlags::GENERIC_DEFINITION) {
            let variance = match wk {
                WellKnown::IEnumerableT
                | WellKnown::IReadOnlyCollectionT
                | WellKnown::IReadOnlyListT => GenericParamFlags::COVARIANT,
                _ => GenericParamFlags::empty(),
            };
            desc.generic_params = vec![GenericParam::new("T", variance)];
        }
        desc
    }

    /// Allocate a fresh token for a declared type
    pub fn alloc_token(&self) -> Token {
        let row = self.next_def.fetch_add(1, Ordering::Relaxed);
        Token::from_parts(Token::TYPE_DEF, row)
    }

    fn publish(&self, desc: TypeDesc) -> TypeDescRc {
        let desc = Arc::new(desc);
        self.types_by_fullname.insert(desc.fullname(), desc.token);
        self.types.insert(desc.token, desc.clone());
        desc
    }

    /// Register a declared type.
    ///
    /// The base type, interfaces and element must already be registered, the base must not be
    /// an interface, every listed interface must be one, and the full name must be unused.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] for unknown references, [`crate::Error::TypeInsert`]
    /// for a duplicate full name and [`crate::Error::TypeError`] for inconsistent relationships.
    pub fn register(&self, desc: TypeDesc) -> Result<TypeDescRc> {
        if self.types.contains_key(&desc.token) {
            return Err(TypeError(format!(
                "Token {} is already registered",
                desc.token
            )));
        }

        if let Some(base) = desc.base {
            let base = self.resolve(base)?;
            if base.is_interface() {
                return Err(TypeError(format!(
                    "{} cannot extend interface {}",
                    desc.fullname(),
                    base.fullname()
                )));
            }
            if base.is_sealed() {
                return Err(TypeError(format!(
                    "{} cannot extend sealed type {}",
                    desc.fullname(),
                    base.fullname()
                )));
            }
        }

        for iface in &desc.interfaces {
            let iface = self.resolve(*iface)?;
            if !iface.is_interface() {
                return Err(TypeError(format!(
                    "{} cannot implement non-interface {}",
                    desc.fullname(),
                    iface.fullname()
                )));
            }
        }

        if let Some(element) = desc.element {
            self.resolve(element)?;
        }

        let fullname = desc.fullname();
        match self.types_by_fullname.entry(fullname.clone()) {
            Entry::Occupied(_) => Err(TypeInsert(fullname)),
            Entry::Vacant(slot) => {
                slot.insert(desc.token);
                let desc = Arc::new(desc);
                self.types.insert(desc.token, desc.clone());
                Ok(desc)
            }
        }
    }

    /// Get a type by token
    #[must_use]
    pub fn get(&self, token: Token) -> Option<TypeDescRc> {
        self.types.get(&token).map(|entry| entry.value().clone())
    }

    /// Get a type by token, failing if it is unknown
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] if no type carries the token.
    pub fn resolve(&self, token: Token) -> Result<TypeDescRc> {
        self.get(token).ok_or(TypeNotFound(token))
    }

    /// Get a type by its full name (e.g. `System.Int32`)
    #[must_use]
    pub fn get_by_fullname(&self, fullname: &str) -> Option<TypeDescRc> {
        let token = *self.types_by_fullname.get(fullname)?;
        self.get(token)
    }

    /// Get one of the pre-registered framework types
    #[must_use]
    pub fn well_known(&self, wk: WellKnown) -> TypeDescRc {
        let index = WellKnown::iter().position(|w| w == wk).unwrap_or_default();
        self.well_known[index].clone()
    }

    /// Check if a type is the given framework type
    #[must_use]
    pub fn is_well_known(&self, ty: &TypeDesc, wk: WellKnown) -> bool {
        self.well_known
            .iter()
            .zip(WellKnown::iter())
            .any(|(desc, w)| w == wk && desc.token == ty.token)
    }

    /// The framework type a token denotes, if any
    #[must_use]
    pub fn well_known_kind(&self, token: Token) -> Option<WellKnown> {
        self.well_known
            .iter()
            .zip(WellKnown::iter())
            .find(|(desc, _)| desc.token == token)
            .map(|(_, wk)| wk)
    }

    /// Get the descriptor of a numeric kind
    #[must_use]
    pub fn numeric(&self, kind: NumericKind) -> TypeDescRc {
        let index = NumericKind::iter().position(|k| k == kind).unwrap_or_default();
        self.numerics[index].clone()
    }

    /// Number of registered types
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the universe is empty (never true after construction)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn get_or_construct(
        &self,
        key: ConstructedKey,
        make: impl FnOnce(Token) -> TypeDesc,
    ) -> TypeDescRc {
        if let Some(token) = self.constructed.get(&key).map(|t| *t) {
            if let Some(existing) = self.get(token) {
                return existing;
            }
        }

        match self.constructed.entry(key) {
            Entry::Occupied(slot) => {
                let token = *slot.get();
                drop(slot);
                match self.get(token) {
                    Some(existing) => existing,
                    None => self.publish(make(token)),
                }
            }
            Entry::Vacant(slot) => {
                let row = self.next_spec.fetch_add(1, Ordering::Relaxed);
                let token = Token::from_parts(Token::TYPE_SPEC, row);
                let desc = self.publish(make(token));
                slot.insert(token);
                desc
            }
        }
    }

    /// Get or create the optional type over a value type
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeError`] if `inner` is not a value type or already optional.
    pub fn optional_of(&self, inner: &TypeDesc) -> Result<TypeDescRc> {
        if !inner.is_value_type() || inner.is_optional() {
            return Err(TypeError(format!(
                "Nullable`1 requires a non-nullable value type, got {}",
                inner.fullname()
            )));
        }

        let nullable = self.well_known(WellKnown::Nullable);
        let value_type = self.well_known(WellKnown::ValueType).token;
        Ok(
            self.get_or_construct(ConstructedKey::Optional(inner.token), |token| {
                let mut desc = TypeDesc::new(
                    token,
                    "System",
                    format!("Nullable`1<{}>", inner.fullname()),
                    TypeFlavor::Optional,
                    TypeFlags::SEALED,
                );
                desc.base = Some(value_type);
                desc.element = Some(inner.token);
                desc.generic_definition = Some(nullable.token);
                desc.generic_args = vec![inner.token];
                desc
            }),
        )
    }

    /// Get or create the array type of `element` with the given rank
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeError`] for a zero rank or an open generic element.
    pub fn array_of(&self, element: &TypeDesc, rank: u32) -> Result<TypeDescRc> {
        if rank == 0 {
            return Err(TypeError("Array rank must be at least 1".to_string()));
        }
        if element.is_generic_definition() {
            return Err(TypeError(format!(
                "Cannot create an array of open generic type {}",
                element.fullname()
            )));
        }

        let array = self.well_known(WellKnown::Array);
        Ok(
            self.get_or_construct(ConstructedKey::Array(element.token, rank), |token| {
                let suffix = format!("[{}]", ",".repeat(rank as usize - 1));
                let mut desc = TypeDesc::new(
                    token,
                    element.namespace.clone(),
                    format!("{}{}", element.name, suffix),
                    TypeFlavor::Array { rank },
                    TypeFlags::SEALED,
                );
                desc.base = Some(array.token);
                desc.interfaces = array.interfaces.clone();
                desc.element = Some(element.token);
                desc
            }),
        )
    }

    /// Get or create an instantiation of a generic definition.
    ///
    /// Instantiating `System.Nullable`1` yields the optional type. Instances share the base and
    /// interfaces of their definition; generic parameters are not substituted into them.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeError`] if `definition` is not generic, the argument count
    /// differs from the parameter count, or an argument is itself an open definition.
    pub fn instantiate(&self, definition: &TypeDesc, args: &[TypeDescRc]) -> Result<TypeDescRc> {
        if !definition.is_generic_definition() {
            return Err(TypeError(format!(
                "{} is not a generic type definition",
                definition.fullname()
            )));
        }
        if definition.generic_params.len() != args.len() {
            return Err(TypeError(format!(
                "{} expects {} generic arguments, got {}",
                definition.fullname(),
                definition.generic_params.len(),
                args.len()
            )));
        }
        if let Some(open) = args.iter().find(|arg| arg.is_generic_definition()) {
            return Err(TypeError(format!(
                "Generic argument {} is an open definition",
                open.fullname()
            )));
        }

        if self.is_well_known(definition, WellKnown::Nullable) {
            return self.optional_of(&args[0]);
        }

        let arg_tokens: Vec<Token> = args.iter().map(|arg| arg.token).collect();
        let key = ConstructedKey::Instance(definition.token, arg_tokens.clone());
        Ok(self.get_or_construct(key, |token| {
            let arg_names: Vec<String> = args.iter().map(|arg| arg.fullname()).collect();
            let mut desc = TypeDesc::new(
                token,
                definition.namespace.clone(),
                format!("{}<{}>", definition.name, arg_names.join(",")),
                definition.flavor,
                definition.flags - TypeFlags::GENERIC_DEFINITION,
            );
            desc.base = definition.base;
            desc.interfaces = definition.interfaces.clone();
            desc.generic_definition = Some(definition.token);
            desc.generic_args = arg_tokens;
            desc
        }))
    }

    /// The base class of a type
    #[must_use]
    pub fn base_of(&self, ty: &TypeDesc) -> Option<TypeDescRc> {
        ty.base.and_then(|base| self.get(base))
    }

    /// The base chain of a type, nearest first, excluding the type itself
    #[must_use]
    pub fn ancestors(&self, ty: &TypeDesc) -> Vec<TypeDescRc> {
        let mut chain = Vec::new();
        let mut current = self.base_of(ty);
        while let Some(base) = current {
            current = self.base_of(&base);
            chain.push(base);
        }
        chain
    }

    /// Check if `ancestor` appears in the base chain of `ty`
    #[must_use]
    pub fn is_subclass_of(&self, ty: &TypeDesc, ancestor: &TypeDesc) -> bool {
        let mut current = ty.base;
        while let Some(token) = current {
            if token == ancestor.token {
                return true;
            }
            current = self.get(token).and_then(|base| base.base);
        }
        false
    }

    /// All interfaces a type implements, transitively across its base chain and interface
    /// inheritance, without duplicates
    #[must_use]
    pub fn interfaces_of(&self, ty: &TypeDesc) -> Vec<TypeDescRc> {
        let mut pending: Vec<Token> = ty.interfaces.iter().rev().copied().collect();
        for ancestor in self.ancestors(ty).iter().rev() {
            pending.extend(ancestor.interfaces.iter().rev());
        }

        let mut result: Vec<TypeDescRc> = Vec::new();
        while let Some(token) = pending.pop() {
            if result.iter().any(|seen| seen.token == token) {
                continue;
            }
            if let Some(iface) = self.get(token) {
                pending.extend(iface.interfaces.iter().rev());
                result.push(iface);
            }
        }
        result
    }

    /// Check if `ty` implements `iface`, directly or transitively
    #[must_use]
    pub fn implements(&self, ty: &TypeDesc, iface: &TypeDesc) -> bool {
        self.interfaces_of(ty)
            .iter()
            .any(|candidate| candidate.token == iface.token)
    }

    /// The element type of an array or the inner type of an optional
    #[must_use]
    pub fn element_of(&self, ty: &TypeDesc) -> Option<TypeDescRc> {
        ty.element.and_then(|element| self.get(element))
    }

    /// The inner type of an optional, or the type itself
    #[must_use]
    pub fn unwrap_optional(&self, ty: &TypeDescRc) -> TypeDescRc {
        if ty.is_optional() {
            if let Some(inner) = self.element_of(ty) {
                return inner;
            }
        }
        ty.clone()
    }

    /// The generic definition a type instantiates
    #[must_use]
    pub fn generic_definition_of(&self, ty: &TypeDesc) -> Option<TypeDescRc> {
        ty.generic_definition.and_then(|def| self.get(def))
    }

    /// The generic arguments of an instantiation
    #[must_use]
    pub fn generic_args_of(&self, ty: &TypeDesc) -> Vec<TypeDescRc> {
        ty.generic_args
            .iter()
            .filter_map(|arg| self.get(*arg))
            .collect()
    }

    /// Declare a user conversion operator on `declaring`.
    ///
    /// Either the input or the output (after unwrapping optionals) must be the declaring type,
    /// input and output must differ, neither may be an interface or `System.Object`, and a
    /// type may declare at most one operator per input/output pair.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] for unknown tokens and [`crate::Error::TypeError`]
    /// if the declaration violates the rules above.
    pub fn declare_operator(
        &self,
        declaring: Token,
        input: Token,
        output: Token,
        is_implicit: bool,
        procedure: ConvertFn,
    ) -> Result<UserOperatorRc> {
        let declaring_ty = self.resolve(declaring)?;
        let input_ty = self.resolve(input)?;
        let output_ty = self.resolve(output)?;

        if input == output {
            return Err(TypeError(format!(
                "Conversion operator on {} converts {} to itself",
                declaring_ty.fullname(),
                input_ty.fullname()
            )));
        }
        if self.unwrap_optional(&input_ty).token != declaring
            && self.unwrap_optional(&output_ty).token != declaring
        {
            return Err(TypeError(format!(
                "Conversion operator on {} must convert to or from the declaring type",
                declaring_ty.fullname()
            )));
        }
        for side in [&input_ty, &output_ty] {
            if side.is_interface() || self.is_well_known(side, WellKnown::Object) {
                return Err(TypeError(format!(
                    "Conversion operator on {} cannot convert to or from {}",
                    declaring_ty.fullname(),
                    side.fullname()
                )));
            }
        }

        let name = if is_implicit { "op_Implicit" } else { "op_Explicit" };
        let signature = format!(
            "{}.{}({}) -> {}",
            declaring_ty.fullname(),
            name,
            input_ty.fullname(),
            output_ty.fullname()
        );

        let mut declared = self.operators.entry(declaring).or_default();
        if declared
            .iter()
            .any(|op| op.input == input && op.output == output)
        {
            return Err(TypeError(format!(
                "{} already declares a conversion from {} to {}",
                declaring_ty.fullname(),
                input_ty.fullname(),
                output_ty.fullname()
            )));
        }

        let row = self.next_operator.fetch_add(1, Ordering::Relaxed);
        let operator = Arc::new(UserConversionOperator::new(
            Token::from_parts(Token::OPERATOR, row),
            declaring,
            input,
            output,
            is_implicit,
            signature,
            procedure,
        ));
        declared.push(operator.clone());
        drop(declared);

        let generation = self.operator_generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(
            operator = %operator.signature,
            generation,
            "declared user conversion operator"
        );
        Ok(operator)
    }

    /// Operators declared directly by a type, in declaration order
    #[must_use]
    pub fn operators_declared_by(&self, ty: &TypeDesc) -> Vec<UserOperatorRc> {
        self.operators
            .get(&ty.token)
            .map(|declared| declared.clone())
            .unwrap_or_default()
    }

    /// Counter bumped on every operator declaration, used to invalidate derived caches
    #[must_use]
    pub fn operator_generation(&self) -> u64 {
        self.operator_generation.load(Ordering::Acquire)
    }
}

impl Default for TypeUniverse {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::converter::Value;

    #[test]
    fn test_well_known_registered() {
        let universe = TypeUniverse::new();
        assert_eq!(universe.len(), WellKnown::COUNT + NumericKind::COUNT);

        for wk in WellKnown::iter() {
            let desc = universe.well_known(wk);
            assert_eq!(desc.fullname(), wk.fullname());
            assert_eq!(universe.well_known_kind(desc.token), Some(wk));
        }

        let int32 = universe.get_by_fullname("System.Int32").unwrap();
        assert_eq!(int32.token, universe.numeric(NumericKind::I4).token);
        assert!(universe.is_subclass_of(&int32, &universe.well_known(WellKnown::ValueType)));
    }

    #[test]
    fn test_list_family_variance() {
        let universe = TypeUniverse::new();
        let enumerable = universe.well_known(WellKnown::IEnumerableT);
        assert_eq!(
            enumerable.generic_params[0].variance(),
            crate::typesystem::Variance::Covariant
        );
        let list = universe.well_known(WellKnown::IListT);
        assert_eq!(
            list.generic_params[0].variance(),
            crate::typesystem::Variance::Invariant
        );
    }

    #[test]
    fn test_constructed_types_unique() {
        let universe = TypeUniverse::new();
        let int32 = universe.numeric(NumericKind::I4);

        let a = universe.optional_of(&int32).unwrap();
        let b = universe.optional_of(&int32).unwrap();
        assert_eq!(a.token, b.token);
        assert!(a.token.is_constructed());
        assert_eq!(universe.element_of(&a).unwrap().token, int32.token);

        let arr = universe.array_of(&int32, 1).unwrap();
        assert_eq!(arr.fullname(), "System.Int32[]");
        let matrix = universe.array_of(&int32, 2).unwrap();
        assert_eq!(matrix.fullname(), "System.Int32[,]");
        assert_ne!(arr.token, matrix.token);

        let nullable = universe.well_known(WellKnown::Nullable);
        let via_instantiate = universe.instantiate(&nullable, &[int32.clone()]).unwrap();
        assert_eq!(via_instantiate.token, a.token);
    }

    #[test]
    fn test_optional_rejects_reference_and_nested() {
        let universe = TypeUniverse::new();
        let string = universe.well_known(WellKnown::String);
        assert!(matches!(
            universe.optional_of(&string),
            Err(crate::Error::TypeError(_))
        ));

        let optional = universe
            .optional_of(&universe.numeric(NumericKind::I4))
            .unwrap();
        assert!(universe.optional_of(&optional).is_err());
    }

    #[test]
    fn test_instantiate_validation() {
        let universe = TypeUniverse::new();
        let list = universe.well_known(WellKnown::IListT);
        let string = universe.well_known(WellKnown::String);

        let instance = universe.instantiate(&list, &[string.clone()]).unwrap();
        assert_eq!(
            instance.fullname(),
            "System.Collections.Generic.IList`1<System.String>"
        );
        assert!(instance.is_interface());
        assert!(!instance.is_generic_definition());
        assert_eq!(universe.generic_definition_of(&instance).unwrap().token, list.token);

        assert!(universe.instantiate(&list, &[]).is_err());
        assert!(universe.instantiate(&string, &[string.clone()]).is_err());
    }

    #[test]
    fn test_interfaces_transitive() {
        let universe = TypeUniverse::new();
        let array = universe
            .array_of(&universe.well_known(WellKnown::String), 1)
            .unwrap();
        let interfaces = universe.interfaces_of(&array);
        assert!(interfaces
            .iter()
            .any(|i| universe.is_well_known(i, WellKnown::IEnumerable)));
        assert!(universe.implements(&array, &universe.well_known(WellKnown::ICollection)));

        let mut seen: Vec<Token> = interfaces.iter().map(|i| i.token).collect();
        seen.dedup();
        assert_eq!(seen.len(), interfaces.len());
    }

    #[test]
    fn test_register_duplicate_name() {
        let universe = TypeUniverse::new();
        let object = universe.well_known(WellKnown::Object);

        let mut desc = TypeDesc::new(
            universe.alloc_token(),
            "App",
            "Widget",
            TypeFlavor::Class,
            TypeFlags::empty(),
        );
        desc.base = Some(object.token);
        universe.register(desc).unwrap();

        let mut again = TypeDesc::new(
            universe.alloc_token(),
            "App",
            "Widget",
            TypeFlavor::Class,
            TypeFlags::empty(),
        );
        again.base = Some(object.token);
        assert!(matches!(
            universe.register(again),
            Err(crate::Error::TypeInsert(name)) if name == "App.Widget"
        ));
    }

    #[test]
    fn test_declare_operator_validation() {
        let universe = TypeUniverse::new();
        let int32 = universe.numeric(NumericKind::I4);
        let int64 = universe.numeric(NumericKind::I8);
        let object = universe.well_known(WellKnown::Object);

        let mut money = TypeDesc::new(
            universe.alloc_token(),
            "App",
            "Money",
            TypeFlavor::Struct,
            TypeFlags::SEALED,
        );
        money.base = Some(universe.well_known(WellKnown::ValueType).token);
        let money = universe.register(money).unwrap();

        let identity: ConvertFn = Arc::new(Ok::<Value, crate::Error>);
        let before = universe.operator_generation();

        let op = universe
            .declare_operator(money.token, int32.token, money.token, true, identity.clone())
            .unwrap();
        assert_eq!(op.signature, "App.Money.op_Implicit(System.Int32) -> App.Money");
        assert_eq!(universe.operator_generation(), before + 1);

        // duplicate signature
        assert!(universe
            .declare_operator(money.token, int32.token, money.token, false, identity.clone())
            .is_err());
        // unrelated to declaring type
        assert!(universe
            .declare_operator(money.token, int32.token, int64.token, true, identity.clone())
            .is_err());
        // object is not allowed
        assert!(universe
            .declare_operator(money.token, money.token, object.token, true, identity.clone())
            .is_err());

        // optional of the declaring type counts
        let optional = universe.optional_of(&money).unwrap();
        assert!(universe
            .declare_operator(money.token, optional.token, int64.token, false, identity)
            .is_ok());

        assert_eq!(universe.operators_declared_by(&money).len(), 2);
        assert!(universe.operators_declared_by(&int32).is_empty());
    }
}
