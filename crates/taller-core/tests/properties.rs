//! Property tests for the purchase line-item editor.
//!
//! These cover the invariants that must hold for any sequence of operator
//! actions: the collection never empties, derived amounts always match
//! their inputs, totals always equal the sum of the lines, rejected
//! edits change nothing, and amounts too large for `Money` are rejected
//! rather than wrapped.

use proptest::prelude::*;
use taller_core::{
    EditorError, ItemField, LineItem, Money, PurchaseItemsEditor, PurchaseTotals, Quantity,
    ValidationError, MAX_ITEM_QUANTITY,
};

/// One operator action, addressed by position in the current row list.
#[derive(Debug, Clone)]
enum Action {
    Add,
    Remove(usize),
    Edit(usize, ItemField, String),
}

fn arb_field() -> impl Strategy<Value = ItemField> {
    prop_oneof![
        Just(ItemField::Quantity),
        Just(ItemField::UnitPrice),
        Just(ItemField::TaxRate),
    ]
}

/// Mix of valid and invalid raw inputs, including amounts at the limits
/// of what the parser accepts.
fn arb_raw() -> impl Strategy<Value = String> {
    prop_oneof![
        (0i64..500).prop_map(|n| n.to_string()),
        (-50i64..0).prop_map(|n| n.to_string()),
        (0i64..100_000, 0u32..100).prop_map(|(whole, frac)| format!("{}.{:02}", whole, frac)),
        (MAX_QUANTITY - 10..=MAX_QUANTITY + 1).prop_map(|n| n.to_string()),
        (MIN_15_DIGITS..=MAX_15_DIGITS, 0u32..100)
            .prop_map(|(whole, frac)| format!("{}.{:02}", whole, frac)),
        Just("999999999999999.99".to_string()),
        Just("9999999999999999".to_string()),
        Just("abc".to_string()),
        Just(String::new()),
        Just("101".to_string()),
    ]
}

const MAX_QUANTITY: i64 = MAX_ITEM_QUANTITY;
const MIN_15_DIGITS: i64 = 100_000_000_000_000;
const MAX_15_DIGITS: i64 = 999_999_999_999_999;

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Add),
        (0usize..8).prop_map(Action::Remove),
        (0usize..8, arb_field(), arb_raw()).prop_map(|(i, f, raw)| Action::Edit(i, f, raw)),
    ]
}

fn apply(editor: &mut PurchaseItemsEditor, action: &Action) -> Result<(), EditorError> {
    let pick = |editor: &PurchaseItemsEditor, i: usize| {
        let items = editor.items();
        items[i % items.len()].id().clone()
    };
    match action {
        Action::Add => {
            editor.add_item();
            Ok(())
        }
        Action::Remove(i) => {
            let id = pick(editor, *i);
            editor.remove_item(&id).map(|_| ())
        }
        Action::Edit(i, field, raw) => {
            let id = pick(editor, *i);
            editor.handle_item_change(&id, *field, raw)
        }
    }
}

/// round(q × p × rate / 100) computed independently of the crate.
fn expected_iva(item: &LineItem) -> i64 {
    let exact = item.unit_price().cents() as i128
        * item.quantity().milli() as i128
        * item.tax_rate().bps() as i128;
    ((exact + 5_000_000) / 10_000_000) as i64
}

fn expected_net(item: &LineItem) -> i64 {
    let exact = item.unit_price().cents() as i128 * item.quantity().milli() as i128;
    ((exact + 500) / 1_000) as i64
}

proptest! {
    #[test]
    fn collection_never_empty(actions in prop::collection::vec(
        prop_oneof![Just(Action::Add), (0usize..8).prop_map(Action::Remove)],
        0..60,
    )) {
        let mut editor = PurchaseItemsEditor::new();
        for action in &actions {
            let _ = apply(&mut editor, action);
            prop_assert!(editor.len() >= 1);
        }
    }

    #[test]
    fn derived_amounts_match_inputs(actions in prop::collection::vec(arb_action(), 0..40)) {
        let mut editor = PurchaseItemsEditor::new();
        for action in &actions {
            let _ = apply(&mut editor, action);
            for item in editor.items() {
                prop_assert!(item.quantity() > Quantity::from_milli(0));
                prop_assert!(!item.unit_price().is_negative());
                prop_assert_eq!(item.iva_amount().cents(), expected_iva(item));
                prop_assert_eq!(
                    item.line_total().cents(),
                    expected_net(item) + item.iva_amount().cents()
                );
            }
        }
    }

    #[test]
    fn totals_equal_sum_of_lines(actions in prop::collection::vec(arb_action(), 0..40)) {
        let mut editor = PurchaseItemsEditor::new();
        for action in &actions {
            let _ = apply(&mut editor, action);

            let total: Money = editor.items().iter().map(LineItem::line_total).sum();
            let iva: Money = editor.items().iter().map(LineItem::iva_amount).sum();
            prop_assert_eq!(editor.totals().total, total);
            prop_assert_eq!(editor.totals().iva_total, iva);
            prop_assert_eq!(editor.totals(), PurchaseTotals::from_items(editor.items()));

            let again = editor.recompute_totals();
            prop_assert_eq!(again, editor.recompute_totals());
        }
    }

    #[test]
    fn rejected_operations_change_nothing(actions in prop::collection::vec(arb_action(), 0..40)) {
        let mut editor = PurchaseItemsEditor::new();
        for action in &actions {
            let before_items = editor.items().to_vec();
            let before_totals = editor.totals();

            if apply(&mut editor, action).is_err() {
                prop_assert_eq!(editor.items(), before_items.as_slice());
                prop_assert_eq!(editor.totals(), before_totals);
            }
        }
    }

    #[test]
    fn amounts_near_limits_never_wrap(
        qty in 1i64..=MAX_QUANTITY,
        whole in MIN_15_DIGITS..=MAX_15_DIGITS,
        frac in 0u32..100,
        tax in 0u32..=100,
    ) {
        let mut editor = PurchaseItemsEditor::new();
        let id = editor.items()[0].id().clone();
        editor.handle_item_change(&id, ItemField::TaxRate, &tax.to_string()).unwrap();
        editor.handle_item_change(&id, ItemField::Quantity, &qty.to_string()).unwrap();
        let before = editor.items().to_vec();

        let price = format!("{}.{:02}", whole, frac);
        let cents = whole as i128 * 100 + frac as i128;
        let net = cents * qty as i128;
        let iva = (net * tax as i128 * 100 + 5_000) / 10_000;
        let exact_total = net + iva;

        match editor.handle_item_change(&id, ItemField::UnitPrice, &price) {
            Ok(()) => {
                prop_assert!(exact_total <= i64::MAX as i128);
                let line = &editor.items()[0];
                prop_assert_eq!(line.line_total().cents() as i128, exact_total);
                prop_assert_eq!(editor.totals().total, line.line_total());
            }
            Err(EditorError::ValidationRejected { source, .. }) => {
                prop_assert!(exact_total > i64::MAX as i128);
                let too_large = matches!(source, ValidationError::TooLarge { .. });
                prop_assert!(too_large);
                prop_assert_eq!(editor.items(), before.as_slice());
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }
}
